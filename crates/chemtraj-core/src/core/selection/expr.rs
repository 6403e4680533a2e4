use crate::core::models::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Comparison {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
        }
    }
}

/// String-valued atom attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Type,
    Resname,
}

impl TextField {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "name" => Some(TextField::Name),
            "type" => Some(TextField::Type),
            "resname" => Some(TextField::Resname),
            _ => None,
        }
    }

    fn value<'a>(self, frame: &'a Frame, index: usize) -> Option<&'a str> {
        match self {
            TextField::Name => frame.atom(index).map(|atom| atom.name.as_str()),
            TextField::Type => frame.atom(index).map(|atom| atom.atomic_type.as_str()),
            TextField::Resname => frame
                .topology()
                .residue_for_atom(index)
                .map(|residue| residue.name.as_str()),
        }
    }
}

/// Number-valued atom attributes. Positions are in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Index,
    Mass,
    Charge,
    X,
    Y,
    Z,
    Resid,
}

impl NumericField {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "index" => Some(NumericField::Index),
            "mass" => Some(NumericField::Mass),
            "charge" => Some(NumericField::Charge),
            "x" => Some(NumericField::X),
            "y" => Some(NumericField::Y),
            "z" => Some(NumericField::Z),
            "resid" => Some(NumericField::Resid),
            _ => None,
        }
    }

    fn value(self, frame: &Frame, index: usize) -> Option<f64> {
        let position = frame.positions().get(index);
        match self {
            NumericField::Index => Some(index as f64),
            NumericField::Mass => frame.atom(index).map(|atom| atom.mass),
            NumericField::Charge => frame.atom(index).map(|atom| atom.charge),
            NumericField::X => position.map(|p| p.x),
            NumericField::Y => position.map(|p| p.y),
            NumericField::Z => position.map(|p| p.z),
            NumericField::Resid => frame
                .topology()
                .residue_for_atom(index)
                .and_then(|residue| residue.id)
                .map(|id| id as f64),
        }
    }
}

/// A parsed selection, evaluated against one atom at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    All,
    None,
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// Matches when the attribute equals any of `values`, or none of them
    /// when `equal` is false. Atoms without the attribute never match.
    Text {
        field: TextField,
        equal: bool,
        values: Vec<String>,
    },
    Numeric {
        field: NumericField,
        comparison: Comparison,
        value: f64,
    },
}

impl Expr {
    pub fn is_match(&self, frame: &Frame, index: usize) -> bool {
        match self {
            Expr::All => true,
            Expr::None => false,
            Expr::Not(inner) => !inner.is_match(frame, index),
            Expr::And(lhs, rhs) => lhs.is_match(frame, index) && rhs.is_match(frame, index),
            Expr::Or(lhs, rhs) => lhs.is_match(frame, index) || rhs.is_match(frame, index),
            Expr::Text {
                field,
                equal,
                values,
            } => field
                .value(frame, index)
                .is_some_and(|actual| values.iter().any(|value| value == actual) == *equal),
            Expr::Numeric {
                field,
                comparison,
                value,
            } => field
                .value(frame, index)
                .is_some_and(|actual| comparison.holds(actual, *value)),
        }
    }
}
