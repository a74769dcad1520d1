//! Contract shapes surrogates conform to.
//!
//! A [`Contract`] lists the members a surrogate exposes. Each member is a
//! name plus parameter types, optionally tagged with a [`DeclaredRule`] for
//! the single-target variant. Every contract implicitly carries the two
//! default members `to_string()` and `equals(any)`.
//!
//! A call selects the overload whose parameters match its arguments most
//! closely (see [`Value::conformance`]). When no single overload is at least
//! as close as every other on each argument, the call is ambiguous.

use crate::reflect::{MemberKind, TargetType};
use crate::rule::{AccessFlags, SignatureKey};
use crate::value::{ParamType, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Name of the implicit stringification member.
pub const TO_STRING: &str = "to_string";
/// Name of the implicit equality member.
pub const EQUALS: &str = "equals";

// ─────────────────────────────────────────────────────────────────────────────
// Member signatures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSig {
    name: String,
    params: Vec<ParamType>,
}

impl MemberSig {
    pub fn new(name: impl Into<String>, params: Vec<ParamType>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn key(&self) -> SignatureKey {
        SignatureKey::for_method(&self.name, &self.params)
    }

    /// Whether `args` can be passed to this member.
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.conformance(args).is_some()
    }

    /// Per-argument conformance scores, or `None` if `args` do not fit.
    pub fn conformance(&self, args: &[Value]) -> Option<Vec<u32>> {
        if self.params.len() != args.len() {
            return None;
        }
        self.params
            .iter()
            .zip(args)
            .map(|(p, a)| a.conformance(p))
            .collect()
    }
}

impl fmt::Display for MemberSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(p.qualified_name())?;
        }
        f.write_str(")")
    }
}

/// The two members every surrogate answers even without a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultMember {
    ToString,
    Equals,
}

impl DefaultMember {
    /// Any one-argument `equals` is the equality member, whatever its
    /// declared parameter type.
    pub fn of(sig: &MemberSig) -> Option<Self> {
        match (sig.name(), sig.params()) {
            (TO_STRING, []) => Some(Self::ToString),
            (EQUALS, [_]) => Some(Self::Equals),
            _ => None,
        }
    }

    fn sig(self) -> MemberSig {
        match self {
            Self::ToString => MemberSig::new(TO_STRING, Vec::new()),
            Self::Equals => MemberSig::new(EQUALS, vec![ParamType::Any]),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Declared rules
// ─────────────────────────────────────────────────────────────────────────────

/// Inline rule attached to a contract member (single-target variant).
///
/// The target type and instance come from the dispatcher, so a declared rule
/// only names the member and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredRule {
    target_name: String,
    kind: MemberKind,
    access: AccessFlags,
    declared_only: bool,
}

impl DeclaredRule {
    pub fn field(target: impl Into<String>) -> Self {
        Self::new(target.into(), MemberKind::Field)
    }

    pub fn method(target: impl Into<String>) -> Self {
        Self::new(target.into(), MemberKind::Method)
    }

    fn new(target_name: String, kind: MemberKind) -> Self {
        Self {
            target_name,
            kind,
            access: AccessFlags::INSTANCE,
            declared_only: false,
        }
    }

    pub fn static_access(mut self) -> Self {
        self.access = AccessFlags::STATIC;
        self
    }

    pub fn declared_only(mut self) -> Self {
        self.declared_only = true;
        self
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn is_declared_only(&self) -> bool {
        self.declared_only
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMember {
    sig: MemberSig,
    declared: Option<DeclaredRule>,
}

impl ContractMember {
    pub fn sig(&self) -> &MemberSig {
        &self.sig
    }

    pub fn name(&self) -> &str {
        self.sig.name()
    }

    pub fn declared(&self) -> Option<&DeclaredRule> {
        self.declared.as_ref()
    }

    pub fn default_member(&self) -> Option<DefaultMember> {
        DefaultMember::of(&self.sig)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Why a call could not be matched to a contract member.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OverloadError {
    #[error("no member '{name}' accepts the given arguments")]
    NoMatch { name: String },

    #[error("call to '{name}' matches {} equally well", .candidates.join(" and "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
}

pub struct Contract {
    name: String,
    members: Vec<ContractMember>,
    mapped_class: Option<Arc<TargetType>>,
}

impl Contract {
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            name: name.into(),
            members: Vec::new(),
            mapped_class: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[ContractMember] {
        &self.members
    }

    /// Type instantiated when a declared surrogate is built without a source.
    pub fn mapped_class(&self) -> Option<&Arc<TargetType>> {
        self.mapped_class.as_ref()
    }

    /// Member with exactly this name and parameter list.
    pub fn member(&self, name: &str, params: &[ParamType]) -> Option<&ContractMember> {
        self.members
            .iter()
            .find(|m| m.sig.name == name && m.sig.params == params)
    }

    /// Member a call `name(args)` selects: the most specific overload.
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<&ContractMember, OverloadError> {
        let candidates: Vec<(&ContractMember, Vec<u32>)> = self
            .members
            .iter()
            .filter(|m| m.sig.name == name)
            .filter_map(|m| m.sig.conformance(args).map(|scores| (m, scores)))
            .collect();
        if candidates.is_empty() {
            return Err(OverloadError::NoMatch {
                name: name.to_string(),
            });
        }

        let closest: Vec<&ContractMember> = candidates
            .iter()
            .filter(|(_, scores)| {
                candidates
                    .iter()
                    .all(|(_, other)| scores.iter().zip(other).all(|(a, b)| a >= b))
            })
            .map(|(m, _)| *m)
            .collect();
        match closest.as_slice() {
            [member] => Ok(*member),
            tied => {
                let tied: Vec<&ContractMember> = if tied.is_empty() {
                    candidates.iter().map(|(m, _)| *m).collect()
                } else {
                    tied.to_vec()
                };
                Err(OverloadError::Ambiguous {
                    name: name.to_string(),
                    candidates: tied.iter().map(|m| m.sig.to_string()).collect(),
                })
            }
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.sig.name == name)
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field(
                "members",
                &self.members.iter().map(|m| m.sig.to_string()).collect::<Vec<_>>(),
            )
            .field("mapped_class", &self.mapped_class.as_ref().map(|t| t.name()))
            .finish()
    }
}

pub struct ContractBuilder {
    name: String,
    members: Vec<ContractMember>,
    mapped_class: Option<Arc<TargetType>>,
}

impl ContractBuilder {
    /// Member without an inline rule.
    pub fn member(self, name: impl Into<String>, params: Vec<ParamType>) -> Self {
        self.push(MemberSig::new(name, params), None)
    }

    /// Member tagged with its own rule.
    pub fn mapped(
        self,
        name: impl Into<String>,
        params: Vec<ParamType>,
        rule: DeclaredRule,
    ) -> Self {
        self.push(MemberSig::new(name, params), Some(rule))
    }

    pub fn mapped_class(mut self, ty: Arc<TargetType>) -> Self {
        self.mapped_class = Some(ty);
        self
    }

    fn push(mut self, sig: MemberSig, declared: Option<DeclaredRule>) -> Self {
        // a redeclared signature replaces the earlier entry
        self.members.retain(|m| m.sig != sig);
        self.members.push(ContractMember { sig, declared });
        self
    }

    pub fn build(mut self) -> Arc<Contract> {
        for default in [DefaultMember::ToString, DefaultMember::Equals] {
            let sig = default.sig();
            if !self.members.iter().any(|m| m.sig == sig) {
                self.members.push(ContractMember {
                    sig,
                    declared: None,
                });
            }
        }
        Arc::new(Contract {
            name: self.name,
            members: self.members,
            mapped_class: self.mapped_class,
        })
    }
}
