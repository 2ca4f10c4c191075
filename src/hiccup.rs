//! Hiccup encoding of a parse tree.
//!
//! A rule renders as a sequence whose first element is the rule name, followed by
//! its parts; a terminal renders as its matched text. Serialized with serde, a
//! rule becomes the JSON array `[name, parts...]` and a leaf a JSON string, which
//! is the shape Instaparse prints for its `:hiccup` output.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hiccup {
    Rule { name: String, parts: Vec<Hiccup> },
    Leaf(String),
}

impl Hiccup {
    pub fn rule(name: impl Into<String>, parts: Vec<Hiccup>) -> Self {
        Hiccup::Rule {
            name: name.into(),
            parts,
        }
    }

    pub fn leaf(text: impl Into<String>) -> Self {
        Hiccup::Leaf(text.into())
    }

    /// The rule name, or `None` for a leaf.
    pub fn name(&self) -> Option<&str> {
        match self {
            Hiccup::Rule { name, .. } => Some(name.as_str()),
            Hiccup::Leaf(_) => None,
        }
    }

    /// The elements after the rule name; empty for a leaf.
    pub fn parts(&self) -> &[Hiccup] {
        match self {
            Hiccup::Rule { parts, .. } => parts.as_slice(),
            Hiccup::Leaf(_) => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Hiccup::Leaf(_))
    }

    /// Leaf texts in document order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// All leaf texts concatenated, without separators.
    pub fn text(&self) -> String {
        self.leaves().collect()
    }

    /// First direct child rule called `name`.
    pub fn find(&self, name: &str) -> Option<&Hiccup> {
        self.parts().iter().find(|part| part.name() == Some(name))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Two-space indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Hiccup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Hiccup::Leaf(text) => serializer.serialize_str(text),
            Hiccup::Rule { name, parts } => {
                let mut seq = serializer.serialize_seq(Some(parts.len() + 1))?;
                seq.serialize_element(name)?;
                for part in parts {
                    seq.serialize_element(part)?;
                }
                seq.end()
            }
        }
    }
}

/// EDN-flavoured rendering: `[:list "(" [:symbol "a"] ")"]`.
impl fmt::Display for Hiccup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hiccup::Leaf(text) => write!(f, "{:?}", text),
            Hiccup::Rule { name, parts } => {
                write!(f, "[:{}", name)?;
                for part in parts {
                    write!(f, " {}", part)?;
                }
                write!(f, "]")
            }
        }
    }
}

pub struct Leaves<'a> {
    stack: Vec<&'a Hiccup>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Hiccup::Leaf(text) => return Some(text.as_str()),
                Hiccup::Rule { parts, .. } => self.stack.extend(parts.iter().rev()),
            }
        }
        None
    }
}
