//! Signature Binder
//!
//! **Core Responsibility:**
//! Choose a calling convention for a decoded fixture input against the
//! resolved entry point.
//!
//! Fixture corpora inconsistently encode "one argument that is a list"
//! versus "several arguments packed into a list". Trial binding in a fixed
//! priority order resolves the ambiguity using the entry point's declared
//! arity as ground truth. Each rule is a pure predicate plus constructor.

use std::collections::BTreeMap;

use verdex_common::value::DecodedValue;

use crate::inspect::EntryPoint;

/// The chosen argument-passing strategy for one fixture. Ephemeral.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundCall {
    /// Call with no arguments, feeding the raw fixture text as stdin.
    ZeroArgStdin { raw_input: String },
    /// Call with named arguments matched to declared parameters.
    Keyword(BTreeMap<String, DecodedValue>),
    /// Spread a sequence across the parameters, one element each.
    PositionalSpread(Vec<DecodedValue>),
    /// Pass the whole decoded value as a single argument.
    SinglePositional(DecodedValue),
}

/// Bind a decoded input to the entry point. First matching rule wins:
/// zero arity, keyword subset, arity-matching spread, one-level unwrap,
/// single positional.
pub fn bind(decoded: &DecodedValue, entry: &EntryPoint, raw_input: &str) -> BoundCall {
    if entry.arity() == 0 {
        return BoundCall::ZeroArgStdin {
            raw_input: raw_input.to_string(),
        };
    }

    if let DecodedValue::Map(map) = decoded {
        let declared = entry.named_params();
        if map.keys().all(|k| declared.contains(&k.as_str())) {
            return BoundCall::Keyword(map.clone());
        }
    }

    if let DecodedValue::Seq(items) = decoded {
        if items.len() == entry.arity() {
            return BoundCall::PositionalSpread(items.clone());
        }
        if items.len() == 1 {
            if let DecodedValue::Seq(inner) = &items[0] {
                if inner.len() == entry.arity() {
                    return BoundCall::PositionalSpread(inner.clone());
                }
            }
        }
    }

    BoundCall::SinglePositional(decoded.clone())
}
