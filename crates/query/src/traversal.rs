use crate::options::FetchOptions;

const MEANINGFUL_TEXT: &str = "text()[normalize-space(.) != '']";

/// The directional methods of a node set, each one expression plus the
/// options it is fetched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Traversal {
    Children,
    Contents,
    Parent,
    Parents,
    Next,
    NextAll,
    Prev,
    PrevAll,
    Siblings,
    Closest,
}

impl Traversal {
    pub(crate) fn expression(self) -> String {
        match self {
            Traversal::Children => "*".to_string(),
            Traversal::Contents => format!("*|{}", MEANINGFUL_TEXT),
            Traversal::Parent => "parent::*".to_string(),
            Traversal::Parents => "ancestor::*".to_string(),
            Traversal::Next => {
                "following-sibling::node()[self::* or (self::text() and normalize-space(.) != '')][1]"
                    .to_string()
            }
            Traversal::NextAll => format!("following-sibling::*|following-sibling::{}", MEANINGFUL_TEXT),
            Traversal::Prev => {
                "preceding-sibling::node()[self::* or (self::text() and normalize-space(.) != '')][1]"
                    .to_string()
            }
            Traversal::PrevAll => format!("preceding-sibling::*|preceding-sibling::{}", MEANINGFUL_TEXT),
            Traversal::Siblings => format!(
                "{}|{}",
                Traversal::PrevAll.expression(),
                Traversal::NextAll.expression()
            ),
            Traversal::Closest => "ancestor-or-self::*".to_string(),
        }
    }

    pub(crate) fn options(self) -> FetchOptions {
        match self {
            Traversal::Parents | Traversal::PrevAll => FetchOptions::REVERSE,
            Traversal::Closest => FetchOptions::REVERSE | FetchOptions::INCLUDE_STOP,
            _ => FetchOptions::UNIQUE,
        }
    }
}
