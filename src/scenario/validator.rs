//! Scenario validation
//!
//! Checks run against the merged log so that "before its begin" means
//! before in replay order, not in declaration order.
//!
//! Operations issued after a transaction's commit or abort are not errors:
//! replay drops them deterministically. They are reported as warnings.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::warn;

use super::errors::{ScenarioError, ScenarioResult};
use super::{OperationKind, OperationLog, ScenarioDefinition};

/// A non-fatal finding about a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioWarning {
    pub tx: String,
    pub index: usize,
    pub kind: OperationKind,
    pub message: String,
}

/// Validates a definition against its merged log.
///
/// Returns the first error found, or the list of warnings.
pub fn validate(def: &ScenarioDefinition, log: &OperationLog) -> ScenarioResult<Vec<ScenarioWarning>> {
    if def.transactions.is_empty() {
        return Err(ScenarioError::EmptyScenario);
    }
    if def.items.is_empty() {
        return Err(ScenarioError::NoItems);
    }
    if let Some(item) = def.items.first_duplicate() {
        return Err(ScenarioError::DuplicateItem(item.to_string()));
    }

    let mut names = BTreeSet::new();
    for (position, tx) in def.transactions.iter().enumerate() {
        if tx.name.trim().is_empty() {
            return Err(ScenarioError::EmptyTransactionName { position });
        }
        if !names.insert(tx.name.as_str()) {
            return Err(ScenarioError::DuplicateTransaction(tx.name.clone()));
        }
    }

    let mut warnings = Vec::new();
    // Name -> the terminal operation's kind, once one has been seen.
    let mut begun: HashMap<&str, Option<OperationKind>> = HashMap::new();

    for (index, op) in log.operations().iter().enumerate() {
        let tx = op.tx_name.as_str();

        if op.kind == OperationKind::Begin {
            if begun.insert(tx, None).is_some() {
                return Err(ScenarioError::DuplicateBegin {
                    tx: tx.to_string(),
                    index,
                });
            }
            continue;
        }

        let ended = match begun.get_mut(tx) {
            None => {
                return Err(ScenarioError::OperationBeforeBegin {
                    tx: tx.to_string(),
                    index,
                    kind: op.kind,
                })
            }
            Some(ended) => ended,
        };

        if op.kind.needs_target() {
            let item = op.target.as_deref().ok_or_else(|| ScenarioError::MissingTarget {
                tx: tx.to_string(),
                index,
                kind: op.kind,
            })?;
            if !log.items().contains_key(item) {
                return Err(ScenarioError::UnknownItem {
                    tx: tx.to_string(),
                    index,
                    item: item.to_string(),
                });
            }
            if op.kind == OperationKind::Write && op.value.is_none() {
                return Err(ScenarioError::MissingValue {
                    tx: tx.to_string(),
                    index,
                    item: item.to_string(),
                });
            }
        }

        if let Some(end) = *ended {
            let warning = ScenarioWarning {
                tx: tx.to_string(),
                index,
                kind: op.kind,
                message: format!("issued after {}; replay will ignore it", end),
            };
            warn!(tx = %warning.tx, index, kind = %op.kind, "operation after transaction end");
            warnings.push(warning);
        } else if op.kind.is_terminal() {
            *ended = Some(op.kind);
        }
    }

    for tx in &def.transactions {
        if !begun.contains_key(tx.name.as_str()) {
            return Err(ScenarioError::MissingBegin(tx.name.clone()));
        }
    }

    for moment in &def.key_moments {
        if moment.step > log.len() {
            return Err(ScenarioError::KeyMomentOutOfRange {
                step: moment.step,
                len: log.len(),
            });
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{KeyMoment, OperationDefinition, SeedItems, TransactionDefinition};

    fn op(kind: OperationKind, time: u64, target: Option<&str>, value: Option<i64>) -> OperationDefinition {
        OperationDefinition {
            kind,
            time,
            target: target.map(str::to_string),
            value,
            comment: None,
        }
    }

    fn def(transactions: Vec<TransactionDefinition>) -> ScenarioDefinition {
        let items: SeedItems = [("x".to_string(), 50)].into_iter().collect();
        ScenarioDefinition {
            name: "test".into(),
            description: None,
            suggested_mode: None,
            items,
            transactions,
            key_moments: Vec::new(),
        }
    }

    fn tx(name: &str, operations: Vec<OperationDefinition>) -> TransactionDefinition {
        TransactionDefinition {
            name: name.into(),
            color: None,
            operations,
        }
    }

    fn check(def: &ScenarioDefinition) -> ScenarioResult<Vec<ScenarioWarning>> {
        let log = OperationLog::merge(def.items.to_map(), &def.transactions);
        validate(def, &log)
    }

    fn simple_tx(name: &str, start: u64) -> TransactionDefinition {
        tx(
            name,
            vec![
                op(OperationKind::Begin, start, None, None),
                op(OperationKind::Read, start + 1, Some("x"), None),
                op(OperationKind::Commit, start + 2, None, None),
            ],
        )
    }

    #[test]
    fn test_valid_scenario() {
        let d = def(vec![simple_tx("T1", 0), simple_tx("T2", 10)]);
        assert_eq!(check(&d), Ok(Vec::new()));
    }

    #[test]
    fn test_empty_scenario() {
        assert_eq!(check(&def(Vec::new())), Err(ScenarioError::EmptyScenario));
    }

    #[test]
    fn test_no_items() {
        let mut d = def(vec![simple_tx("T1", 0)]);
        d.items = SeedItems::default();
        assert_eq!(check(&d), Err(ScenarioError::NoItems));
    }

    #[test]
    fn test_duplicate_item() {
        let mut d = def(vec![simple_tx("T1", 0)]);
        d.items = [("x".to_string(), 50), ("x".to_string(), 80)].into_iter().collect();
        let err = check(&d).unwrap_err();
        assert_eq!(err, ScenarioError::DuplicateItem("x".into()));
        assert_eq!(err.code(), "TXR_SCENARIO_DUPLICATE_ITEM");
    }

    #[test]
    fn test_duplicate_transaction_name() {
        let d = def(vec![simple_tx("T1", 0), simple_tx("T1", 10)]);
        assert_eq!(check(&d), Err(ScenarioError::DuplicateTransaction("T1".into())));
    }

    #[test]
    fn test_empty_transaction_name() {
        let d = def(vec![simple_tx("  ", 0)]);
        assert_eq!(check(&d), Err(ScenarioError::EmptyTransactionName { position: 0 }));
    }

    #[test]
    fn test_operation_before_begin_uses_merged_order() {
        // Declared first, but its time puts the read before the begin.
        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 10, None, None),
                op(OperationKind::Read, 5, Some("x"), None),
            ],
        )]);
        assert_eq!(
            check(&d),
            Err(ScenarioError::OperationBeforeBegin {
                tx: "T1".into(),
                index: 0,
                kind: OperationKind::Read
            })
        );
    }

    #[test]
    fn test_unknown_item() {
        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 0, None, None),
                op(OperationKind::Read, 1, Some("y"), None),
            ],
        )]);
        assert!(matches!(check(&d), Err(ScenarioError::UnknownItem { item, .. }) if item == "y"));
    }

    #[test]
    fn test_missing_target_and_value() {
        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 0, None, None),
                op(OperationKind::Read, 1, None, None),
            ],
        )]);
        assert!(matches!(check(&d), Err(ScenarioError::MissingTarget { .. })));

        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 0, None, None),
                op(OperationKind::Write, 1, Some("x"), None),
            ],
        )]);
        assert!(matches!(check(&d), Err(ScenarioError::MissingValue { .. })));
    }

    #[test]
    fn test_duplicate_begin() {
        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 0, None, None),
                op(OperationKind::Begin, 1, None, None),
            ],
        )]);
        assert_eq!(check(&d), Err(ScenarioError::DuplicateBegin { tx: "T1".into(), index: 1 }));
    }

    #[test]
    fn test_missing_begin() {
        let d = def(vec![simple_tx("T1", 0), tx("T2", Vec::new())]);
        assert_eq!(check(&d), Err(ScenarioError::MissingBegin("T2".into())));
    }

    #[test]
    fn test_operation_after_end_is_a_warning() {
        let d = def(vec![tx(
            "T1",
            vec![
                op(OperationKind::Begin, 0, None, None),
                op(OperationKind::Abort, 1, None, None),
                op(OperationKind::Write, 2, Some("x"), Some(1)),
            ],
        )]);
        let warnings = check(&d).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].index, 2);
        assert!(warnings[0].message.contains("abort"));
    }

    #[test]
    fn test_key_moment_range() {
        let mut d = def(vec![simple_tx("T1", 0)]);
        d.key_moments.push(KeyMoment::new(3, "end"));
        assert!(check(&d).is_ok());

        d.key_moments.push(KeyMoment::new(4, "past"));
        assert_eq!(check(&d), Err(ScenarioError::KeyMomentOutOfRange { step: 4, len: 3 }));
    }
}
