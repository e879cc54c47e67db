//! Segments, elements and delimiters
//!
//! A segment is an id followed by elements; an element is one or more
//! components. Elements are addressed 1-based, the way implementation guides
//! number them (`NM109` is `get(9)` on an `NM1` segment).

use std::fmt;

use core_kernel::identifiers::RESERVED_CHARACTERS;

use crate::error::EdiError;

/// Separator characters of an interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub element: char,
    pub component: char,
    pub repetition: char,
    pub segment: char,
}

impl Default for Delimiters {
    /// Delimiters used on everything the gateway emits
    fn default() -> Self {
        Self {
            element: '|',
            component: ':',
            repetition: '^',
            segment: '~',
        }
    }
}

impl Delimiters {
    /// Reads the delimiters from a raw ISA header
    ///
    /// The element separator is the fourth character; the component
    /// separator is ISA16 and the segment terminator follows it directly.
    pub fn detect(raw: &str) -> Result<Self, EdiError> {
        let raw = raw.trim_start();
        if !raw.starts_with("ISA") {
            return Err(EdiError::malformed("interchange does not start with ISA"));
        }

        let mut chars = raw.chars().skip(3);
        let element = chars
            .next()
            .ok_or_else(|| EdiError::malformed("truncated ISA header"))?;

        let mut separators = 1;
        let mut isa11 = String::new();
        let mut component = None;
        let mut segment = None;
        for c in chars {
            if separators == 16 {
                if component.is_none() {
                    component = Some(c);
                    continue;
                }
                segment = Some(c);
                break;
            }
            if c == element {
                separators += 1;
            } else if separators == 11 {
                isa11.push(c);
            }
        }

        let (component, segment) = match (component, segment) {
            (Some(component), Some(segment)) => (component, segment),
            _ => return Err(EdiError::malformed("truncated ISA header")),
        };

        let repetition = match isa11.chars().collect::<Vec<_>>().as_slice() {
            [c] if !c.is_ascii_alphanumeric() => *c,
            _ => Delimiters::default().repetition,
        };

        Ok(Self {
            element,
            component,
            repetition,
            segment,
        })
    }

    fn contains(&self, c: char) -> bool {
        c == self.element || c == self.component || c == self.repetition || c == self.segment
    }
}

/// One X12 segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: String,
    elements: Vec<Vec<String>>,
}

impl Segment {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of elements, trailing empties included
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends a simple element
    pub fn push(mut self, value: impl Into<String>) -> Self {
        self.elements.push(vec![value.into()]);
        self
    }

    /// Appends a composite element
    pub fn push_composite<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements
            .push(components.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the element at a 1-based position, padding with empty elements
    pub fn set(mut self, position: usize, value: impl Into<String>) -> Self {
        if position == 0 {
            return self;
        }
        while self.elements.len() < position {
            self.elements.push(vec![String::new()]);
        }
        self.elements[position - 1] = vec![value.into()];
        self
    }

    /// First component of the element at a 1-based position, or `""`
    pub fn get(&self, position: usize) -> &str {
        self.component(position, 1)
    }

    /// Component `index` (1-based) of element `position`, or `""`
    pub fn component(&self, position: usize, index: usize) -> &str {
        position
            .checked_sub(1)
            .and_then(|p| self.elements.get(p))
            .and_then(|e| index.checked_sub(1).and_then(|i| e.get(i)))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Non-empty value of an element, trimmed
    pub fn value(&self, position: usize) -> Option<&str> {
        let value = self.get(position).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Renders the segment without its terminator, dropping trailing empty
    /// elements and components
    pub fn render(&self, delimiters: &Delimiters) -> String {
        let mut elements: Vec<String> = self
            .elements
            .iter()
            .map(|components| {
                let mut parts: Vec<&str> = components.iter().map(String::as_str).collect();
                while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
                    parts.pop();
                }
                parts.join(&delimiters.component.to_string())
            })
            .collect();
        while elements.last().is_some_and(|e| e.is_empty()) {
            elements.pop();
        }

        let mut out = self.id.clone();
        for element in elements {
            out.push(delimiters.element);
            out.push_str(&element);
        }
        out
    }

    /// Parses a single segment (terminator already removed)
    pub fn parse(raw: &str, delimiters: &Delimiters) -> Self {
        let mut parts = raw.split(delimiters.element);
        let id = parts.next().unwrap_or_default().trim().to_string();
        let elements = if id == "ISA" {
            // ISA16 holds the component separator itself and must not be split
            parts.map(|p| vec![p.to_string()]).collect()
        } else {
            parts
                .map(|p| p.split(delimiters.component).map(str::to_string).collect())
                .collect()
        };
        Self { id, elements }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Delimiters::default()))
    }
}

/// Splits a raw interchange into segments
pub fn split_segments(raw: &str, delimiters: &Delimiters) -> Vec<Segment> {
    raw.split(delimiters.segment)
        .map(|s| s.trim_matches(|c: char| c == '\r' || c == '\n' || c == ' '))
        .filter(|s| !s.is_empty())
        .map(|s| Segment::parse(s, delimiters))
        .collect()
}

/// Makes free text safe for a single element
///
/// Delimiter characters become spaces and the result is cut to `max`
/// characters.
pub fn sanitize_text(text: &str, max: usize) -> String {
    let defaults = Delimiters::default();
    let cleaned: String = text
        .chars()
        .map(|c| {
            if RESERVED_CHARACTERS.contains(&c) || defaults.contains(c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();
    cleaned.trim().chars().take(max).collect::<String>().trim_end().to_string()
}
