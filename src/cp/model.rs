//! Backend-agnostic constraint model.
//!
//! A [`CpModel`] holds boolean variables, integer variables with closed
//! domains, and linear constraints over integer-weighted sums. A
//! constraint may be enforced by a literal (`lit ⇒ C`); full reification
//! (`b ⇔ C`) is expressed with two or three enforced constraints.
//!
//! Every constraint carries a [`Family`] tag, so a backend can solve with
//! whole families switched off and a caller can tell which family a
//! violation belongs to.
//!
//! # Integer encoding
//! Integer variables are direct-encoded: each domain value gets a value
//! literal, exactly one literal is true, and the integer equals
//! `Σ v·lit_v`. [`CpModel::reify_eq`] hands out those literals, so
//! `x == v` is never re-posted per constraint family.
//!
//! # Reference
//! - Walsh (2000), "SAT v CSP" (direct encoding)
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming", Ch. 12

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolVar(usize);

impl BoolVar {
    /// Position in the model's boolean table.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// The negated literal.
    #[inline]
    pub fn not(self) -> Lit {
        Lit {
            var: self,
            negated: true,
        }
    }
}

/// An integer decision variable with a finite domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntVar(usize);

impl IntVar {
    /// Position in the model's integer table.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit {
    /// Underlying variable.
    pub var: BoolVar,
    /// True for `¬var`.
    pub negated: bool,
}

impl From<BoolVar> for Lit {
    fn from(var: BoolVar) -> Self {
        Self {
            var,
            negated: false,
        }
    }
}

/// A variable occurring in a linear expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Bool(BoolVar),
    Int(IntVar),
}

/// `Σ coeff·term + constant` with integer coefficients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(Term, i64)>,
    constant: i64,
}

impl LinearExpr {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of booleans with unit coefficients.
    pub fn sum<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = BoolVar>,
    {
        Self {
            terms: vars.into_iter().map(|v| (Term::Bool(v), 1)).collect(),
            constant: 0,
        }
    }

    /// Adds `coeff·var`.
    pub fn plus(mut self, var: BoolVar, coeff: i64) -> Self {
        self.push_bool(var, coeff);
        self
    }

    /// Adds `coeff·var` in place.
    pub fn push_bool(&mut self, var: BoolVar, coeff: i64) {
        self.terms.push((Term::Bool(var), coeff));
    }

    /// Adds `coeff·var` for an integer variable in place.
    pub fn push_int(&mut self, var: IntVar, coeff: i64) {
        self.terms.push((Term::Int(var), coeff));
    }

    /// Adds a constant in place.
    pub fn push_constant(&mut self, value: i64) {
        self.constant += value;
    }

    /// Raw terms (may repeat a variable).
    pub fn terms(&self) -> &[(Term, i64)] {
        &self.terms
    }

    /// Constant part.
    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Merges repeated variables and drops zero coefficients.
    pub fn normalized(&self) -> Self {
        let mut merged: BTreeMap<Term, i64> = BTreeMap::new();
        for &(term, coeff) in &self.terms {
            *merged.entry(term).or_insert(0) += coeff;
        }
        Self {
            terms: merged.into_iter().filter(|&(_, c)| c != 0).collect(),
            constant: self.constant,
        }
    }

    /// Value under a valuation.
    pub fn evaluate(&self, valuation: &Valuation) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(term, coeff)| coeff * valuation.term(term))
                .sum::<i64>()
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(var: BoolVar) -> Self {
        Self::sum([var])
    }
}

/// Comparison between an expression and a right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl Relation {
    /// Whether `lhs ⋈ rhs` holds.
    #[inline]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Relation::Le => lhs <= rhs,
            Relation::Ge => lhs >= rhs,
            Relation::Eq => lhs == rhs,
        }
    }
}

/// Constraint family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Integer-variable encoding; never relaxed.
    Domain,
    Lunch,
    Prep,
    ActivityConsistency,
    Exclusivity,
    AntiRepetition,
    CoreLoad,
    LiteracyLoad,
    PeScheduling,
    TeamMeeting,
    DisciplineMeeting,
    Advisory,
    Elective,
    LoadSmoothing,
    Pin,
}

impl Family {
    /// All families in posting order.
    pub const ALL: [Family; 15] = [
        Family::Domain,
        Family::Lunch,
        Family::Prep,
        Family::ActivityConsistency,
        Family::Exclusivity,
        Family::AntiRepetition,
        Family::CoreLoad,
        Family::LiteracyLoad,
        Family::PeScheduling,
        Family::TeamMeeting,
        Family::DisciplineMeeting,
        Family::Advisory,
        Family::Elective,
        Family::LoadSmoothing,
        Family::Pin,
    ];

    /// Snake-case name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Family::Domain => "domain",
            Family::Lunch => "lunch",
            Family::Prep => "prep",
            Family::ActivityConsistency => "activity_consistency",
            Family::Exclusivity => "exclusivity",
            Family::AntiRepetition => "anti_repetition",
            Family::CoreLoad => "core_load",
            Family::LiteracyLoad => "literacy_load",
            Family::PeScheduling => "pe_scheduling",
            Family::TeamMeeting => "team_meeting",
            Family::DisciplineMeeting => "discipline_meeting",
            Family::Advisory => "advisory",
            Family::Elective => "elective",
            Family::LoadSmoothing => "load_smoothing",
            Family::Pin => "pin",
        }
    }

    /// Whether a backend may be asked to drop this family.
    #[inline]
    pub fn is_relaxable(self) -> bool {
        self != Family::Domain
    }
}

/// Handle to a posted constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(usize);

impl ConstraintId {
    /// Position in posting order.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// `[enforced_by ⇒] expr ⋈ rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Family tag.
    pub family: Family,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Comparison.
    pub relation: Relation,
    /// Right-hand side.
    pub rhs: i64,
    /// Enforcement literal; `None` means always enforced.
    pub enforced_by: Option<Lit>,
}

impl Constraint {
    /// Whether the constraint holds under a valuation.
    pub fn is_satisfied(&self, valuation: &Valuation) -> bool {
        if let Some(lit) = self.enforced_by {
            if !valuation.lit(lit) {
                return true;
            }
        }
        self.relation.holds(self.expr.evaluate(valuation), self.rhs)
    }
}

/// Integer variable metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVarInfo {
    /// Debug name.
    pub name: String,
    domain: Vec<i64>,
    literals: Vec<BoolVar>,
}

impl IntVarInfo {
    /// Sorted, de-duplicated domain.
    pub fn domain(&self) -> &[i64] {
        &self.domain
    }

    /// Smallest domain value (0 for an empty domain).
    pub fn min(&self) -> i64 {
        self.domain.first().copied().unwrap_or(0)
    }

    /// Largest domain value (0 for an empty domain).
    pub fn max(&self) -> i64 {
        self.domain.last().copied().unwrap_or(0)
    }

    /// Value literal for `value`, if in the domain.
    pub fn literal(&self, value: i64) -> Option<BoolVar> {
        self.domain
            .binary_search(&value)
            .ok()
            .map(|i| self.literals[i])
    }

    /// `(value, literal)` pairs in domain order.
    pub fn value_literals(&self) -> impl Iterator<Item = (i64, BoolVar)> + '_ {
        self.domain.iter().copied().zip(self.literals.iter().copied())
    }
}

/// A constraint that failed under a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelViolation {
    /// Offending constraint.
    pub constraint: ConstraintId,
    /// Its family.
    pub family: Family,
}

/// A constraint model.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    name: String,
    bool_names: Vec<String>,
    int_vars: Vec<IntVarInfo>,
    constraints: Vec<Constraint>,
    false_var: Option<BoolVar>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ---- variables ----

    /// Declares a boolean variable.
    pub fn new_bool(&mut self, name: impl Into<String>) -> BoolVar {
        self.bool_names.push(name.into());
        BoolVar(self.bool_names.len() - 1)
    }

    /// Declares an integer variable over a closed domain.
    ///
    /// Creates one value literal per domain value, an exactly-one
    /// constraint over them, and the channel `x = Σ v·lit_v`.
    pub fn new_int<I>(&mut self, name: impl Into<String>, domain: I) -> IntVar
    where
        I: IntoIterator<Item = i64>,
    {
        let name = name.into();
        let mut domain: Vec<i64> = domain.into_iter().collect();
        domain.sort_unstable();
        domain.dedup();

        let literals: Vec<BoolVar> = domain
            .iter()
            .map(|v| self.new_bool(format!("{name}=={v}")))
            .collect();

        let var = IntVar(self.int_vars.len());
        self.add(
            Family::Domain,
            LinearExpr::sum(literals.iter().copied()),
            Relation::Eq,
            1,
        );
        let mut channel = LinearExpr::new();
        channel.push_int(var, 1);
        for (&value, &lit) in domain.iter().zip(&literals) {
            channel.push_bool(lit, -value);
        }

        self.int_vars.push(IntVarInfo {
            name,
            domain,
            literals,
        });
        self.add(Family::Domain, channel, Relation::Eq, 0);
        var
    }

    /// Literal equivalent to `var == value`.
    ///
    /// Out-of-domain values yield a shared literal fixed to false.
    pub fn reify_eq(&mut self, var: IntVar, value: i64) -> BoolVar {
        match self.int_vars.get(var.0).and_then(|info| info.literal(value)) {
            Some(lit) => lit,
            None => self.constant_false(),
        }
    }

    /// A boolean fixed to false.
    pub fn constant_false(&mut self) -> BoolVar {
        if let Some(var) = self.false_var {
            return var;
        }
        let var = self.new_bool("false");
        self.add(Family::Domain, LinearExpr::from(var), Relation::Eq, 0);
        self.false_var = Some(var);
        var
    }

    // ---- constraints ----

    /// Posts `expr ⋈ rhs`.
    pub fn add(
        &mut self,
        family: Family,
        expr: LinearExpr,
        relation: Relation,
        rhs: i64,
    ) -> ConstraintId {
        self.push(Constraint {
            family,
            expr,
            relation,
            rhs,
            enforced_by: None,
        })
    }

    /// Posts `lit ⇒ expr ⋈ rhs`.
    pub fn add_enforced(
        &mut self,
        family: Family,
        lit: impl Into<Lit>,
        expr: LinearExpr,
        relation: Relation,
        rhs: i64,
    ) -> ConstraintId {
        self.push(Constraint {
            family,
            expr,
            relation,
            rhs,
            enforced_by: Some(lit.into()),
        })
    }

    /// Posts `b ⇔ expr ⋈ rhs`.
    pub fn add_reified(
        &mut self,
        family: Family,
        b: BoolVar,
        expr: LinearExpr,
        relation: Relation,
        rhs: i64,
    ) {
        match relation {
            Relation::Le => {
                self.add_enforced(family, b, expr.clone(), Relation::Le, rhs);
                self.add_enforced(family, b.not(), expr, Relation::Ge, rhs + 1);
            }
            Relation::Ge => {
                self.add_enforced(family, b, expr.clone(), Relation::Ge, rhs);
                self.add_enforced(family, b.not(), expr, Relation::Le, rhs - 1);
            }
            Relation::Eq => {
                // b, below, above: exactly one holds
                let base = self.bool_name(b).unwrap_or("reified").to_string();
                let below = self.new_bool(format!("{base}_lt"));
                let above = self.new_bool(format!("{base}_gt"));
                self.add_enforced(family, b, expr.clone(), Relation::Eq, rhs);
                self.add_enforced(family, below, expr.clone(), Relation::Le, rhs - 1);
                self.add_enforced(family, above, expr, Relation::Ge, rhs + 1);
                self.add(family, LinearExpr::sum([b, below, above]), Relation::Eq, 1);
            }
        }
    }

    /// Posts `Σ vars ⋈ rhs`.
    pub fn add_sum(
        &mut self,
        family: Family,
        vars: impl IntoIterator<Item = BoolVar>,
        relation: Relation,
        rhs: i64,
    ) -> ConstraintId {
        self.add(family, LinearExpr::sum(vars), relation, rhs)
    }

    /// Posts `a ⇒ b` as `a ≤ b`.
    pub fn add_implies(&mut self, family: Family, a: BoolVar, b: BoolVar) -> ConstraintId {
        self.add(family, LinearExpr::from(a).plus(b, -1), Relation::Le, 0)
    }

    /// Posts `a == b`.
    pub fn add_equal(&mut self, family: Family, a: BoolVar, b: BoolVar) -> ConstraintId {
        self.add(family, LinearExpr::from(a).plus(b, -1), Relation::Eq, 0)
    }

    /// Fixes a boolean.
    pub fn fix(&mut self, family: Family, var: BoolVar, value: bool) -> ConstraintId {
        self.add(family, LinearExpr::from(var), Relation::Eq, i64::from(value))
    }

    fn push(&mut self, constraint: Constraint) -> ConstraintId {
        self.constraints.push(constraint);
        ConstraintId(self.constraints.len() - 1)
    }

    // ---- inspection ----

    /// Number of boolean variables (value literals included).
    pub fn bool_count(&self) -> usize {
        self.bool_names.len()
    }

    /// Number of integer variables.
    pub fn int_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Number of posted constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// All constraints in posting order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// A constraint by handle.
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.0)
    }

    /// Integer variable metadata.
    pub fn int_var(&self, var: IntVar) -> Option<&IntVarInfo> {
        self.int_vars.get(var.0)
    }

    /// All integer variables in declaration order.
    pub fn int_vars(&self) -> &[IntVarInfo] {
        &self.int_vars
    }

    /// Debug name of a boolean.
    pub fn bool_name(&self, var: BoolVar) -> Option<&str> {
        self.bool_names.get(var.0).map(String::as_str)
    }

    /// Constraint count per family.
    pub fn family_counts(&self) -> BTreeMap<Family, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    /// Number of constraints in one family.
    pub fn count_in(&self, family: Family) -> usize {
        self.constraints.iter().filter(|c| c.family == family).count()
    }

    /// Bounds of a term.
    pub fn term_bounds(&self, term: Term) -> (i64, i64) {
        match term {
            Term::Bool(_) => (0, 1),
            Term::Int(v) => self
                .int_var(v)
                .map(|info| (info.min(), info.max()))
                .unwrap_or((0, 0)),
        }
    }

    /// Bounds of an expression, constant included.
    pub fn bounds(&self, expr: &LinearExpr) -> (i64, i64) {
        expr.terms()
            .iter()
            .fold((expr.constant(), expr.constant()), |(lo, hi), &(term, coeff)| {
                let (tmin, tmax) = self.term_bounds(term);
                if coeff >= 0 {
                    (lo + coeff * tmin, hi + coeff * tmax)
                } else {
                    (lo + coeff * tmax, hi + coeff * tmin)
                }
            })
    }

    /// Lists every constraint a valuation violates.
    pub fn check(&self, valuation: &Valuation) -> Vec<ModelViolation> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_satisfied(valuation))
            .map(|(i, c)| ModelViolation {
                constraint: ConstraintId(i),
                family: c.family,
            })
            .collect()
    }
}

/// An assignment of values to every variable of a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valuation {
    bools: Vec<bool>,
    ints: Vec<i64>,
}

impl Valuation {
    /// Creates a valuation from raw tables.
    pub fn new(bools: Vec<bool>, ints: Vec<i64>) -> Self {
        Self { bools, ints }
    }

    /// All-false valuation sized for a model, integers at their minimum.
    pub fn zeroed(model: &CpModel) -> Self {
        Self {
            bools: vec![false; model.bool_count()],
            ints: model.int_vars().iter().map(|v| v.min()).collect(),
        }
    }

    /// Value of a boolean (false when out of range).
    #[inline]
    pub fn bool(&self, var: BoolVar) -> bool {
        self.bools.get(var.0).copied().unwrap_or(false)
    }

    /// Value of an integer (0 when out of range).
    #[inline]
    pub fn int(&self, var: IntVar) -> i64 {
        self.ints.get(var.0).copied().unwrap_or(0)
    }

    /// Truth of a literal.
    #[inline]
    pub fn lit(&self, lit: Lit) -> bool {
        self.bool(lit.var) != lit.negated
    }

    /// Numeric value of a term.
    pub fn term(&self, term: Term) -> i64 {
        match term {
            Term::Bool(v) => i64::from(self.bool(v)),
            Term::Int(v) => self.int(v),
        }
    }

    /// Sets a boolean.
    pub fn set_bool(&mut self, var: BoolVar, value: bool) {
        if let Some(slot) = self.bools.get_mut(var.0) {
            *slot = value;
        }
    }

    /// Sets an integer together with its value literals.
    pub fn set_int(&mut self, model: &CpModel, var: IntVar, value: i64) {
        if let Some(slot) = self.ints.get_mut(var.0) {
            *slot = value;
        }
        if let Some(info) = model.int_var(var) {
            for (v, lit) in info.value_literals() {
                self.set_bool(lit, v == value);
            }
        }
    }
}
