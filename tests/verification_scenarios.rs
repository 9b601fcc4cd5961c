use serde_json::json;
use xbrl_verify_core::validation::CheckDetails;
use xbrl_verify_core::{CheckKind, CheckResult, FilingInput, QualityLevel, Severity, VerificationConfig, Verifier};

const BALANCE_SHEET: &str = "http://example.com/role/BalanceSheet";
const INCOME: &str = "http://example.com/role/IncomeStatement";

fn filing(statements: serde_json::Value, networks: serde_json::Value) -> FilingInput {
    serde_json::from_value(json!({
        "filing_id": "0000000000-24-000001",
        "statements": { "statements": statements },
        "networks": networks,
    }))
    .unwrap()
}

fn verifier() -> Verifier {
    Verifier::new(VerificationConfig::default()).unwrap()
}

fn calculations(results: &[CheckResult]) -> Vec<&CheckResult> {
    results.iter().filter(|r| r.kind == CheckKind::CalculationConsistency).collect()
}

fn balance_sheet_network() -> serde_json::Value {
    json!([{
        "role": BALANCE_SHEET,
        "arcs": [
            { "parent_concept": "us-gaap:Assets", "child_concept": "us-gaap:AssetsCurrent", "weight": 1.0 },
            { "parent_concept": "us-gaap:Assets", "child_concept": "us-gaap:AssetsNoncurrent", "weight": 1.0 }
        ]
    }])
}

#[test]
fn summation_holds_exactly() {
    let input = filing(
        json!([{ "name": "BalanceSheet", "facts": [
            { "concept": "us-gaap:Assets", "value": 1000, "decimals": 0, "context_id": "c1", "unit": "USD" },
            { "concept": "us-gaap:AssetsCurrent", "value": 600, "decimals": 0, "context_id": "c1", "unit": "USD" },
            { "concept": "us-gaap:AssetsNoncurrent", "value": 400, "decimals": 0, "context_id": "c1", "unit": "USD" }
        ]}]),
        balance_sheet_network(),
    );
    let report = verifier().verify(&input);
    let calcs = calculations(&report.results);
    assert_eq!(calcs.len(), 1);
    assert_eq!(calcs[0].passed, Some(true));
    assert_eq!(calcs[0].difference, Some(0.0));
    assert_eq!(report.quality.level, QualityLevel::Excellent);
}

#[test]
fn negative_weights_subtract() {
    let input = filing(
        json!([{ "name": "IncomeStatement", "facts": [
            { "concept": "NetIncomeLoss", "value": 300, "context_id": "FY2024" },
            { "concept": "Revenues", "value": 500, "context_id": "FY2024" },
            { "concept": "CostsAndExpenses", "value": 200, "context_id": "FY2024" }
        ]}]),
        json!([{ "role": INCOME, "arcs": [
            { "parent_concept": "NetIncomeLoss", "child_concept": "Revenues", "weight": 1.0 },
            { "parent_concept": "NetIncomeLoss", "child_concept": "CostsAndExpenses", "weight": -1.0 }
        ]}]),
    );
    let report = verifier().verify(&input);
    let calcs = calculations(&report.results);
    assert_eq!(calcs.len(), 1);
    assert_eq!(calcs[0].passed, Some(true));
    assert_eq!(calcs[0].expected_value, Some(300.0));
}

#[test]
fn consistent_duplicates_keep_the_precise_value() {
    let input = filing(
        json!([{ "name": "BalanceSheet", "facts": [
            { "concept": "us-gaap:Assets", "value": 1000, "decimals": -3, "context_id": "c1" },
            { "concept": "us-gaap:Assets", "value": "1,000.4", "decimals": 0, "context_id": "c1" }
        ]}]),
        json!([]),
    );
    let report = verifier().verify(&input);
    assert_eq!(report.diagnostics.groups.duplicate_sets, 1);
    assert_eq!(report.diagnostics.groups.inconsistent_sets, 0);
    let dup = report.results.iter().find(|r| r.kind == CheckKind::DuplicateFacts).unwrap();
    assert_eq!(dup.passed, Some(true));
}

#[test]
fn inconsistent_parent_skips_the_calculation() {
    let input = filing(
        json!([{ "name": "BalanceSheet", "facts": [
            { "concept": "us-gaap:Assets", "value": 1000, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:Assets", "value": 1500, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:AssetsCurrent", "value": 600, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:AssetsNoncurrent", "value": 400, "decimals": 0, "context_id": "c1" }
        ]}]),
        balance_sheet_network(),
    );
    let report = verifier().verify(&input);

    let dup = report.results.iter().find(|r| r.kind == CheckKind::DuplicateFacts).unwrap();
    assert_eq!(dup.passed, Some(false));
    assert_eq!(dup.severity, Severity::Critical);

    let calcs = calculations(&report.results);
    assert_eq!(calcs.len(), 1);
    assert!(calcs[0].skipped);
    assert_eq!(calcs[0].passed, None);
    assert_eq!(report.scores.skipped_checks, 1);
}

#[test]
fn dimensional_child_does_not_bind_to_default_parent() {
    let statements = json!([{ "name": "BalanceSheet", "facts": [
        { "concept": "us-gaap:Assets", "value": 1000, "decimals": 0, "context_id": "AsOf_12_31_2024" },
        { "concept": "us-gaap:AssetsCurrent", "value": 600, "decimals": 0, "context_id": "AsOf_12_31_2024" },
        { "concept": "us-gaap:AssetsNoncurrent", "value": 400, "decimals": 0,
          "context_id": "AsOf_12_31_2024_SegmentAxis_RetailMember" }
    ]}]);
    let input = filing(statements, balance_sheet_network());

    let report = verifier().verify(&input);
    let calcs = calculations(&report.results);
    assert_eq!(calcs.len(), 1);
    assert!(calcs[0].skipped);
    match &calcs[0].details {
        CheckDetails::Skipped(details) => assert_eq!(details.children_missing, vec!["us-gaap:AssetsNoncurrent"]),
        other => panic!("unexpected details {other:?}"),
    }

    // Opting in lets the dimensional child stand in.
    let mut config = VerificationConfig::default();
    config.binding.allow_dimensional_fallback = true;
    let report = Verifier::new(config).unwrap().verify(&input);
    let calcs = calculations(&report.results);
    assert_eq!(calcs[0].passed, Some(true));
    assert_eq!(report.diagnostics.horizontal.fallback_bound, 1);
}

#[test]
fn skipped_calculations_do_not_lower_scores() {
    let input = filing(
        json!([{ "name": "BalanceSheet", "facts": [
            { "concept": "us-gaap:Assets", "value": 1000, "context_id": "c1" },
            { "concept": "us-gaap:AssetsCurrent", "value": 600, "context_id": "c1" }
        ]}]),
        balance_sheet_network(),
    );
    let report = verifier().verify(&input);
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.scores.horizontal_score, 100.0);
    assert_eq!(report.scores.critical_issues, 0);
}

#[test]
fn inline_sign_override_is_applied_before_weights() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("acme-20241231.htm"),
        r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body>
        <ix:nonFraction name="us-gaap:OperatingExpenses" contextRef="FY2024" sign="-" decimals="0">400</ix:nonFraction>
        </body></html>"#,
    )
    .unwrap();

    let mut input = filing(
        json!([{ "name": "IncomeStatement", "facts": [
            { "concept": "us-gaap:NetIncomeLoss", "value": 100, "decimals": 0, "context_id": "FY2024" },
            { "concept": "us-gaap:Revenues", "value": 500, "decimals": 0, "context_id": "FY2024" },
            { "concept": "us-gaap:OperatingExpenses", "value": 400, "decimals": 0, "context_id": "FY2024" }
        ]}]),
        json!([{ "role": INCOME, "arcs": [
            { "parent_concept": "us-gaap:NetIncomeLoss", "child_concept": "us-gaap:Revenues" },
            { "parent_concept": "us-gaap:NetIncomeLoss", "child_concept": "us-gaap:OperatingExpenses" }
        ]}]),
    );

    let without = verifier().verify(&input);
    assert_eq!(calculations(&without.results)[0].passed, Some(false));

    input.instance_location = Some(dir.path().to_path_buf());
    let with = verifier().verify(&input);
    assert_eq!(with.diagnostics.sign_overrides, 1);
    assert_eq!(calculations(&with.results)[0].passed, Some(true));
}

#[test]
fn cross_statement_disagreement_is_a_warning() {
    let input = filing(
        json!([
            { "name": "IncomeStatement", "facts": [
                { "concept": "us-gaap:NetIncomeLoss", "value": 300, "decimals": 0, "context_id": "FY2024" }
            ]},
            { "name": "CashFlow", "facts": [
                { "concept": "us-gaap:NetIncomeLoss", "value": 310, "decimals": 0, "context_id": "FY2024" }
            ]}
        ]),
        json!([]),
    );
    let report = verifier().verify(&input);
    let common: Vec<_> = report.results.iter().filter(|r| r.kind == CheckKind::CommonValuesConsistency).collect();
    assert_eq!(common.len(), 1);
    assert_eq!(common[0].passed, Some(false));
    assert_eq!(common[0].severity, Severity::Warning);
    assert_eq!(report.scores.warning_issues, 1);
}

#[test]
fn reports_are_deterministic() {
    let input = filing(
        json!([{ "name": "BalanceSheet", "facts": [
            { "concept": "us-gaap:Assets", "value": 1000, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:AssetsCurrent", "value": 650, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:AssetsNoncurrent", "value": 400, "decimals": 0, "context_id": "c1" },
            { "concept": "us-gaap:Assets", "value": 900, "decimals": 0, "context_id": "c2" }
        ]}]),
        balance_sheet_network(),
    );
    let v = verifier();
    let first = serde_json::to_string(&v.verify(&input)).unwrap();
    let second = serde_json::to_string(&v.verify(&input)).unwrap();
    assert_eq!(first, second);

    let batch = v.verify_all(&[input.clone(), input]);
    assert_eq!(batch.len(), 2);
    assert_eq!(serde_json::to_string(&batch[1]).unwrap(), first);
}
