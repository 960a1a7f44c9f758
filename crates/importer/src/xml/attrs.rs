use chrono::NaiveDate;
use roxmltree::Node;
use rust_decimal::Decimal;
use tracing::warn;

use crate::decode;
use crate::normalize::normalize_optional;

/// Attribute access over one element. Every lookup is total: a missing or
/// blank attribute is `None`, never an error.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attrs<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input: 'a> Attrs<'a, 'input> {
    pub(crate) fn of(node: Node<'a, 'input>) -> Self {
        Self { node }
    }

    /// Whether the attribute exists at all, blank or not.
    pub(crate) fn has(&self, name: &str) -> bool {
        self.node.attribute(name).is_some()
    }

    pub(crate) fn raw(&self, name: &str) -> Option<&'a str> {
        self.node
            .attribute(name)
            .filter(|value| !value.trim().is_empty())
    }

    /// First non-blank attribute among `names`.
    pub(crate) fn raw_any(&self, names: &[&str]) -> Option<&'a str> {
        names.iter().find_map(|name| self.raw(name))
    }

    pub(crate) fn text(&self, name: &str) -> Option<String> {
        normalize_optional(self.raw(name))
    }

    pub(crate) fn text_any(&self, names: &[&str]) -> Option<String> {
        normalize_optional(self.raw_any(names))
    }

    pub(crate) fn id(&self, name: &str) -> Option<String> {
        self.raw(name).map(|value| value.trim().to_string())
    }

    pub(crate) fn int(&self, name: &str) -> Option<i32> {
        decode::parse_int(self.raw(name))
    }

    pub(crate) fn date(&self, name: &str) -> Option<NaiveDate> {
        decode::parse_date(self.raw(name))
    }

    pub(crate) fn score(&self, name: &str) -> Option<Decimal> {
        decode::parse_score(self.raw(name))
    }

    pub(crate) fn factor(&self, name: &str) -> Option<Decimal> {
        decode::parse_factor(self.raw(name))
    }

    pub(crate) fn flag(&self, name: &str) -> bool {
        decode::parse_flag(self.raw(name))
    }

    /// Decoded GOE grade. Codes outside every known encoding are logged and
    /// read as unscored.
    pub(crate) fn goe(&self, name: &str) -> Option<i8> {
        let raw = self.raw(name);
        if decode::is_unknown_goe_code(raw) {
            warn!(attribute = name, value = raw.unwrap_or_default(), "Unknown GOE code");
        }
        decode::decode_goe(raw)
    }
}
