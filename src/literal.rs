use std::fmt;

use fxhash::FxHashMap;

/// A Boolean variable's internal identity. Variables are allocated densely starting at 1;
/// index 0 is never handed out, so a `Variable` can double as a non-zero literal magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(u32);

impl Variable {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl nohash_hasher::IsEnabled for Variable {}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A literal is a variable together with a polarity, encoded as a signed index: the magnitude
/// names the variable, the sign carries the polarity. `Literal::negate` is therefore a plain
/// integer negation, and `¬¬ℓ = ℓ` falls out of `i32` negation for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i32);

impl Literal {
    pub fn positive(var: Variable) -> Literal {
        Literal(var.0 as i32)
    }

    pub fn negative(var: Variable) -> Literal {
        Literal(-(var.0 as i32))
    }

    pub fn new(var: Variable, is_positive: bool) -> Literal {
        if is_positive {
            Literal::positive(var)
        } else {
            Literal::negative(var)
        }
    }

    pub fn negate(&self) -> Literal {
        Literal(-self.0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn var(&self) -> Variable {
        Variable(self.0.unsigned_abs())
    }
}

/// The bijection between the names used in instance/proof text and the dense internal
/// variable indices. Names are interned on first sight; a name never changes its index.
#[derive(Debug, Default)]
pub struct VariableTable {
    by_name: FxHashMap<String, Variable>,
    names: Vec<String>,
}

impl VariableTable {
    pub fn new() -> VariableTable {
        VariableTable::default()
    }

    /// Looks up the variable for `name`, interning a fresh one if this is the first time
    /// the name has been seen.
    pub fn intern(&mut self, name: &str) -> Variable {
        if let Some(var) = self.by_name.get(name) {
            return *var;
        }
        let var = Variable((self.names.len() + 1) as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), var);
        var
    }

    pub fn name(&self, var: Variable) -> &str {
        &self.names[(var.index() - 1) as usize]
    }

    /// Parses a literal token such as `x1` or `~x1`. Does not intern a new variable unless
    /// the name hasn't been seen, matching how the instance and proof text both introduce
    /// variables implicitly on first mention.
    pub fn parse_literal(&mut self, token: &str) -> Literal {
        if let Some(name) = token.strip_prefix('~') {
            let var = self.intern(name);
            Literal::negative(var)
        } else {
            let var = self.intern(token);
            Literal::positive(var)
        }
    }

    pub fn literal_name(&self, lit: Literal) -> String {
        if lit.is_positive() {
            self.name(lit.var()).to_string()
        } else {
            format!("~{}", self.name(lit.var()))
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
