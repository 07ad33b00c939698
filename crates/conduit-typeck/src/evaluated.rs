//! Results of partial evaluation
//!
//! An [`EvaluatedNode`] is to a value what a [`Type`](crate::Type) is to a
//! type: the partial evaluator folds expressions into these as far as their
//! inputs are known.

use std::fmt;

use conduit_ast::{DeclId, ExprId};
use rustc_hash::FxHashMap;

use crate::constant::Constant;

/// Parameter bindings used while evaluating inside an inlined call
pub type ParameterSubstitutions = FxHashMap<DeclId, EvaluatedNode>;

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedNode {
    Constant(Constant),

    /// Block lambda together with the bindings visible where it was created
    BlockLambdaClosure {
        lambda: ExprId,
        substitutions_on_creation: ParameterSubstitutions,
        results: Vec<DeclId>,
    },

    /// Expression lambda together with the bindings visible where it was created
    ExpressionLambdaClosure {
        lambda: ExprId,
        substitutions_on_creation: ParameterSubstitutions,
        result: ExprId,
    },

    /// Named function, segment, class or annotation that has not been called
    NamedCallable { declaration: DeclId, name: String },

    EnumVariant(EvaluatedEnumVariant),

    List(Vec<EvaluatedNode>),

    Map(EvaluatedMap),

    NamedTuple(EvaluatedNamedTuple),

    /// Could not be folded any further
    Unknown,
}

/// Enum variant, either referenced (`args == None`) or instantiated
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedEnumVariant {
    pub variant: DeclId,
    pub name: String,
    pub takes_parameters: bool,
    pub args: Option<Vec<NamedEntry>>,
}

/// Value bound to a parameter or result declaration
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEntry {
    pub declaration: DeclId,
    pub name: String,
    pub value: EvaluatedNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedMapEntry {
    pub key: EvaluatedNode,
    pub value: EvaluatedNode,
}

/// Map literal in insertion order; duplicate keys are kept
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluatedMap {
    pub entries: Vec<EvaluatedMapEntry>,
}

impl EvaluatedMap {
    pub fn new(entries: Vec<EvaluatedMapEntry>) -> Self {
        Self { entries }
    }

    /// Value of the last entry whose key equals `key`, or `Unknown`
    pub fn get_last_value_for_key(&self, key: &EvaluatedNode) -> EvaluatedNode {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key == *key)
            .map(|entry| entry.value.clone())
            .unwrap_or(EvaluatedNode::Unknown)
    }
}

/// Results of an evaluated call, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluatedNamedTuple {
    pub entries: Vec<NamedEntry>,
}

impl EvaluatedNamedTuple {
    pub fn new(entries: Vec<NamedEntry>) -> Self {
        Self { entries }
    }

    /// Value bound to a result declaration, or `Unknown`
    pub fn get(&self, result: DeclId) -> EvaluatedNode {
        self.entries
            .iter()
            .find(|entry| entry.declaration == result)
            .map(|entry| entry.value.clone())
            .unwrap_or(EvaluatedNode::Unknown)
    }

    pub fn get_by_index(&self, index: usize) -> EvaluatedNode {
        self.entries
            .get(index)
            .map(|entry| entry.value.clone())
            .unwrap_or(EvaluatedNode::Unknown)
    }
}

impl EvaluatedNode {
    pub fn constant(&self) -> Option<&Constant> {
        match self {
            EvaluatedNode::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, EvaluatedNode::Unknown)
    }

    /// Whether the node denotes one specific runtime value
    pub fn is_fully_evaluated(&self) -> bool {
        match self {
            EvaluatedNode::Constant(_) => true,
            EvaluatedNode::BlockLambdaClosure { .. }
            | EvaluatedNode::ExpressionLambdaClosure { .. }
            | EvaluatedNode::NamedCallable { .. }
            | EvaluatedNode::Unknown => false,
            EvaluatedNode::EnumVariant(variant) => {
                !variant.takes_parameters
                    || variant
                        .args
                        .as_ref()
                        .is_some_and(|args| args.iter().all(|arg| arg.value.is_fully_evaluated()))
            }
            EvaluatedNode::List(elements) => elements.iter().all(EvaluatedNode::is_fully_evaluated),
            EvaluatedNode::Map(map) => map
                .entries
                .iter()
                .all(|entry| entry.key.is_fully_evaluated() && entry.value.is_fully_evaluated()),
            EvaluatedNode::NamedTuple(tuple) => tuple.entries.iter().all(|entry| entry.value.is_fully_evaluated()),
        }
    }

    /// A single-entry named tuple behaves like its only value
    pub fn unwrap(self) -> EvaluatedNode {
        match self {
            EvaluatedNode::NamedTuple(mut tuple) if tuple.entries.len() == 1 => match tuple.entries.pop() {
                Some(entry) => entry.value.unwrap(),
                None => EvaluatedNode::Unknown,
            },
            other => other,
        }
    }
}

impl From<Constant> for EvaluatedNode {
    fn from(constant: Constant) -> Self {
        EvaluatedNode::Constant(constant)
    }
}

// =============================================================================
// Display
// =============================================================================

fn join_entries(entries: &[NamedEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{} = {}", entry.name, entry.value))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for EvaluatedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatedNode::Constant(constant) => write!(f, "{}", constant),
            EvaluatedNode::BlockLambdaClosure { .. } => write!(f, "$BlockLambdaClosure"),
            EvaluatedNode::ExpressionLambdaClosure { .. } => write!(f, "$ExpressionLambdaClosure"),
            EvaluatedNode::NamedCallable { name, .. } => write!(f, "$NamedCallable<{}>", name),
            EvaluatedNode::EnumVariant(variant) => match &variant.args {
                Some(args) if variant.takes_parameters => write!(f, "{}({})", variant.name, join_entries(args)),
                _ => write!(f, "{}", variant.name),
            },
            EvaluatedNode::List(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            EvaluatedNode::Map(map) => {
                let entries: Vec<String> = map
                    .entries
                    .iter()
                    .map(|entry| format!("{}: {}", entry.key, entry.value))
                    .collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            EvaluatedNode::NamedTuple(tuple) => write!(f, "({})", join_entries(&tuple.entries)),
            EvaluatedNode::Unknown => write!(f, "$unknown"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u32, name: &str, value: EvaluatedNode) -> NamedEntry {
        NamedEntry {
            declaration: DeclId(index),
            name: name.to_string(),
            value,
        }
    }

    fn null() -> EvaluatedNode {
        EvaluatedNode::Constant(Constant::Null)
    }

    #[test]
    fn test_single_entry_tuple_unwraps() {
        let tuple = EvaluatedNode::NamedTuple(EvaluatedNamedTuple::new(vec![entry(0, "result", null())]));
        assert_eq!(tuple.unwrap(), null());
    }

    #[test]
    fn test_multi_entry_tuple_stays() {
        let tuple = EvaluatedNode::NamedTuple(EvaluatedNamedTuple::new(vec![
            entry(0, "a", null()),
            entry(1, "b", Constant::int(1).into()),
        ]));
        assert_eq!(tuple.clone().unwrap(), tuple);
        assert_eq!(tuple.to_string(), "(a = null, b = 1)");
    }

    #[test]
    fn test_map_lookup_is_last_write_wins() {
        let map = EvaluatedMap::new(vec![
            EvaluatedMapEntry {
                key: null(),
                value: null(),
            },
            EvaluatedMapEntry {
                key: null(),
                value: Constant::int(1).into(),
            },
        ]);
        assert_eq!(map.get_last_value_for_key(&null()), Constant::int(1).into());
        assert_eq!(map.get_last_value_for_key(&Constant::int(1).into()), EvaluatedNode::Unknown);
    }

    #[test]
    fn test_fully_evaluated() {
        assert!(EvaluatedNode::Constant(Constant::Boolean(true)).is_fully_evaluated());
        assert!(!EvaluatedNode::Unknown.is_fully_evaluated());
        assert!(!EvaluatedNode::NamedCallable {
            declaration: DeclId(0),
            name: "f".to_string()
        }
        .is_fully_evaluated());
        assert!(EvaluatedNode::List(vec![null(), Constant::int(2).into()]).is_fully_evaluated());
        assert!(!EvaluatedNode::List(vec![null(), EvaluatedNode::Unknown]).is_fully_evaluated());
    }

    #[test]
    fn test_enum_variant_fully_evaluated() {
        let referenced = EvaluatedEnumVariant {
            variant: DeclId(3),
            name: "V".to_string(),
            takes_parameters: true,
            args: None,
        };
        assert!(!EvaluatedNode::EnumVariant(referenced.clone()).is_fully_evaluated());

        let instantiated = EvaluatedEnumVariant {
            args: Some(vec![entry(4, "p", Constant::int(1).into())]),
            ..referenced.clone()
        };
        assert!(EvaluatedNode::EnumVariant(instantiated.clone()).is_fully_evaluated());
        assert_eq!(EvaluatedNode::EnumVariant(instantiated).to_string(), "V(p = 1)");

        let without_parameters = EvaluatedEnumVariant {
            takes_parameters: false,
            ..referenced
        };
        assert!(EvaluatedNode::EnumVariant(without_parameters).is_fully_evaluated());
    }

    #[test]
    fn test_display() {
        assert_eq!(EvaluatedNode::Unknown.to_string(), "$unknown");
        assert_eq!(
            EvaluatedNode::List(vec![Constant::int(1).into(), Constant::string("a").into()]).to_string(),
            "[1, \"a\"]"
        );
        let map = EvaluatedMap::new(vec![EvaluatedMapEntry {
            key: Constant::string("k").into(),
            value: Constant::Boolean(false).into(),
        }]);
        assert_eq!(EvaluatedNode::Map(map).to_string(), "{\"k\": false}");
        assert_eq!(
            EvaluatedNode::NamedCallable {
                declaration: DeclId(0),
                name: "f".to_string()
            }
            .to_string(),
            "$NamedCallable<f>"
        );
    }

    #[test]
    fn test_variants_never_equal_each_other() {
        assert_ne!(EvaluatedNode::Unknown, null());
        assert_ne!(EvaluatedNode::List(vec![]), EvaluatedNode::Map(EvaluatedMap::default()));
        assert_eq!(EvaluatedNode::List(vec![null()]), EvaluatedNode::List(vec![null()]));
    }
}
