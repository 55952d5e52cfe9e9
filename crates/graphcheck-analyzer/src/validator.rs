use crate::suggest::closest_matches;
use futures::stream::{self, StreamExt};
use graphcheck_core::{
    CallSite, ClassDef, Finding, FunctionSignature, GraphNode, GraphStore, LiteralKind, Param,
    ParsedModule, ResolvedTarget, Result, SymbolKind, TargetScope, Verdict,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::warn;

/// Annotations simple enough to check literals against. `bytes` is left out:
/// a bytes literal and a str literal are the same node kind to the parser,
/// so the comparison would misfire.
const CHECKED_ANNOTATIONS: &[&str] = &["str", "int", "float", "bool", "list", "dict", "set", "tuple"];

/// Attribute chains are followed through recorded types at most this many
/// hops before the validator gives up.
const MAX_CHAIN_HOPS: usize = 8;

#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    pub max_concurrent_lookups: usize,
    pub fuzzy_max_distance: usize,
    pub max_suggestions: usize,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 10,
            fuzzy_max_distance: 2,
            max_suggestions: 3,
        }
    }
}

/// Classifies call sites against an indexed repository namespace.
///
/// Verdicts are data, not errors: a missing symbol is UNKNOWN_SYMBOL, a
/// failed store read is UNVERIFIABLE with the error as the reason, and the
/// validator itself never fails a whole batch.
pub struct KnowledgeGraphValidator {
    store: Arc<dyn GraphStore>,
    settings: ValidatorSettings,
}

/// Outcome of locating a qualified name in the graph.
enum Located {
    Exact(GraphNode),
    /// Longest indexed prefix, the first segment missing below it, and any
    /// segments after that one.
    MissingMember {
        owner: GraphNode,
        missing: String,
        trailing: Vec<String>,
    },
    NotIndexed,
}

enum MemberSearch {
    Found(GraphNode),
    Missing { candidates: Vec<String> },
    UnindexedBase(String),
}

impl KnowledgeGraphValidator {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_settings(store, ValidatorSettings::default())
    }

    pub fn with_settings(store: Arc<dyn GraphStore>, settings: ValidatorSettings) -> Self {
        Self { store, settings }
    }

    /// One finding per call site, in input order. Graph lookups run
    /// concurrently up to the configured bound.
    pub async fn validate(
        &self,
        namespace: &str,
        script: &ParsedModule,
        calls: &[CallSite],
    ) -> Vec<Finding> {
        let concurrency = self.settings.max_concurrent_lookups.max(1);
        let mut indexed: Vec<(usize, Finding)> =
            stream::iter(calls.iter().enumerate().map(|(index, call)| async move {
                (index, self.validate_site(namespace, script, call).await)
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, finding)| finding).collect()
    }

    async fn validate_site(
        &self,
        namespace: &str,
        script: &ParsedModule,
        call: &CallSite,
    ) -> Finding {
        let target = match &call.resolved {
            Some(target) => target,
            None => {
                return finding(
                    call,
                    Verdict::Unverifiable,
                    Some(format!(
                        "could not statically resolve '{}'",
                        call.callee_text
                    )),
                    Vec::new(),
                )
            }
        };
        match target.scope {
            TargetScope::Local => self.validate_local(script, call, target),
            TargetScope::Imported => match self.validate_imported(namespace, call, target).await {
                Ok(found) => found,
                Err(e) => finding(
                    call,
                    Verdict::Unverifiable,
                    Some(format!("graph lookup failed: {}", e)),
                    Vec::new(),
                ),
            },
        }
    }

    // ---- graph-backed validation -------------------------------------

    async fn validate_imported(
        &self,
        namespace: &str,
        call: &CallSite,
        target: &ResolvedTarget,
    ) -> Result<Finding> {
        let (mut current, mut segments) =
            match self.locate(namespace, &target.qualified_name).await? {
                Located::Exact(node) => (node, VecDeque::new()),
                Located::MissingMember {
                    owner,
                    missing,
                    trailing,
                } => {
                    let mut segments: VecDeque<String> = VecDeque::from(trailing);
                    segments.push_front(missing);
                    (owner, segments)
                }
                Located::NotIndexed => {
                    return Ok(finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!(
                            "'{}' is not part of the indexed repository",
                            target.qualified_name
                        )),
                        Vec::new(),
                    ))
                }
            };
        let mut via_instance = target.via_instance;

        for _ in 0..MAX_CHAIN_HOPS {
            if segments.is_empty() {
                return self.finish_target(namespace, call, current, via_instance).await;
            }
            let member = segments.pop_front().unwrap_or_default();
            match current.kind {
                SymbolKind::Class => {
                    match self.find_class_member(namespace, &current, &member).await? {
                        MemberSearch::Found(node) => current = node,
                        MemberSearch::UnindexedBase(base) => {
                            return Ok(finding(
                                call,
                                Verdict::Unverifiable,
                                Some(format!(
                                    "'{}' not found on class '{}' and base class '{}' is not indexed",
                                    member, current.qualified_name, base
                                )),
                                Vec::new(),
                            ))
                        }
                        MemberSearch::Missing { candidates } => {
                            return Ok(self.unknown_symbol(
                                call,
                                format!(
                                    "class '{}' has no member '{}'",
                                    current.qualified_name, member
                                ),
                                &member,
                                candidates,
                            ))
                        }
                    }
                }
                SymbolKind::File => {
                    let members = self.store.members_of(namespace, &current.qualified_name).await?;
                    let candidates: Vec<String> = members
                        .iter()
                        .filter(|m| m.kind == SymbolKind::Function)
                        .map(|m| m.name.clone())
                        .collect();
                    return Ok(self.unknown_symbol(
                        call,
                        format!(
                            "module '{}' has no symbol '{}'",
                            current.qualified_name, member
                        ),
                        &member,
                        candidates,
                    ));
                }
                SymbolKind::Function | SymbolKind::Method => {
                    return Ok(finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!(
                            "the return value of '{}' has an unknown type",
                            current.qualified_name
                        )),
                        Vec::new(),
                    ))
                }
                SymbolKind::Attribute => {
                    // Follow the attribute's recorded type and retry the
                    // member there.
                    match self.attribute_class(namespace, &current).await? {
                        Some(class) => {
                            segments.push_front(member);
                            current = class;
                            via_instance = true;
                        }
                        None => {
                            return Ok(finding(
                                call,
                                Verdict::Unverifiable,
                                Some(format!(
                                    "attribute '{}' has no statically known class type",
                                    current.qualified_name
                                )),
                                Vec::new(),
                            ))
                        }
                    }
                }
                SymbolKind::Repository => {
                    return Ok(finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!(
                            "cannot resolve '{}' below the repository root",
                            call.callee_text
                        )),
                        Vec::new(),
                    ))
                }
            }
        }
        Ok(finding(
            call,
            Verdict::Unverifiable,
            Some(format!(
                "reference chain for '{}' is too deep to verify",
                call.callee_text
            )),
            Vec::new(),
        ))
    }

    /// Terminal dispatch once the chain lands on a node.
    async fn finish_target(
        &self,
        namespace: &str,
        call: &CallSite,
        node: GraphNode,
        via_instance: bool,
    ) -> Result<Finding> {
        match node.kind {
            SymbolKind::Function => Ok(self.finish_callable(call, &node, false)),
            SymbolKind::Method => Ok(self.finish_callable(call, &node, via_instance)),
            SymbolKind::Class => self.finish_constructor(namespace, call, &node).await,
            SymbolKind::Attribute => {
                // Calling an attribute: the only statically usable knowledge
                // is a recorded class type, checked as a construction.
                match self.attribute_class(namespace, &node).await? {
                    Some(class) => self.finish_constructor(namespace, call, &class).await,
                    None => Ok(finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!(
                            "attribute '{}' has no statically known class type",
                            node.qualified_name
                        )),
                        Vec::new(),
                    )),
                }
            }
            SymbolKind::File | SymbolKind::Repository => Ok(finding(
                call,
                Verdict::Unverifiable,
                Some(format!("'{}' is a module, not a callable", node.qualified_name)),
                Vec::new(),
            )),
        }
    }

    fn finish_callable(&self, call: &CallSite, node: &GraphNode, skip_receiver: bool) -> Finding {
        if call.uses_unpacking {
            return finding(
                call,
                Verdict::Unverifiable,
                Some(format!(
                    "'{}' exists, but argument unpacking prevents a signature check",
                    node.qualified_name
                )),
                Vec::new(),
            );
        }
        match &node.signature {
            Some(signature) => shape_finding(call, signature, skip_receiver),
            None => finding(
                call,
                Verdict::Unverifiable,
                Some(format!("no signature recorded for '{}'", node.qualified_name)),
                Vec::new(),
            ),
        }
    }

    /// Constructor check: `__init__` searched on the class and then through
    /// indexed bases, breadth-first, by simple name, cycle-guarded. No
    /// `__init__` anywhere and every base indexed means a zero-parameter
    /// constructor; an unindexed base means nothing can be claimed.
    async fn finish_constructor(
        &self,
        namespace: &str,
        call: &CallSite,
        class: &GraphNode,
    ) -> Result<Finding> {
        if call.uses_unpacking {
            return Ok(finding(
                call,
                Verdict::Unverifiable,
                Some(format!(
                    "'{}' exists, but argument unpacking prevents a signature check",
                    class.qualified_name
                )),
                Vec::new(),
            ));
        }
        let mut queue = VecDeque::from([class.clone()]);
        let mut visited: HashSet<String> = HashSet::from([class.qualified_name.clone()]);
        let mut unindexed_base: Option<String> = None;
        while let Some(current) = queue.pop_front() {
            let init_name = format!("{}.__init__", current.qualified_name);
            if let Some(init) = self.store.lookup(namespace, &init_name).await? {
                return Ok(match &init.signature {
                    Some(signature) => shape_finding(call, signature, true),
                    None => finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!("no signature recorded for '{}'", init_name)),
                        Vec::new(),
                    ),
                });
            }
            for base in &current.bases {
                match self.class_by_type_name(namespace, base).await? {
                    Some(node) => {
                        if visited.insert(node.qualified_name.clone()) {
                            queue.push_back(node);
                        }
                    }
                    None => unindexed_base = Some(base.clone()),
                }
            }
        }
        if let Some(base) = unindexed_base {
            return Ok(finding(
                call,
                Verdict::Unverifiable,
                Some(format!(
                    "base class '{}' of '{}' is not indexed; constructor not verified",
                    base, class.qualified_name
                )),
                Vec::new(),
            ));
        }
        Ok(shape_finding(call, &FunctionSignature::default(), false))
    }

    /// Longest-prefix walk over the qualified name. The full name is tried
    /// first; failing that, the longest indexed proper prefix decides
    /// whether the miss is a provable UNKNOWN_SYMBOL or merely unverifiable.
    async fn locate(&self, namespace: &str, qualified: &str) -> Result<Located> {
        if let Some(node) = self.store.lookup(namespace, qualified).await? {
            return Ok(Located::Exact(node));
        }
        let segments: Vec<&str> = qualified.split('.').collect();
        for end in (1..segments.len()).rev() {
            let prefix = segments[..end].join(".");
            if let Some(owner) = self.store.lookup(namespace, &prefix).await? {
                return Ok(Located::MissingMember {
                    owner,
                    missing: segments[end].to_string(),
                    trailing: segments[end + 1..].iter().map(|s| s.to_string()).collect(),
                });
            }
        }
        Ok(Located::NotIndexed)
    }

    /// Member lookup on a class, then breadth-first through indexed bases.
    /// The unindexed-base answer is only given when the member was not found
    /// on any class that is indexed.
    async fn find_class_member(
        &self,
        namespace: &str,
        class: &GraphNode,
        member: &str,
    ) -> Result<MemberSearch> {
        let mut queue = VecDeque::from([class.clone()]);
        let mut visited: HashSet<String> = HashSet::from([class.qualified_name.clone()]);
        let mut candidates: Vec<String> = Vec::new();
        let mut unindexed_base: Option<String> = None;
        while let Some(current) = queue.pop_front() {
            let members = self.store.members_of(namespace, &current.qualified_name).await?;
            if let Some(found) = members.iter().find(|m| m.name == member) {
                return Ok(MemberSearch::Found(found.clone()));
            }
            candidates.extend(members.iter().map(|m| m.name.clone()));
            for base in &current.bases {
                match self.class_by_type_name(namespace, base).await? {
                    Some(node) => {
                        if visited.insert(node.qualified_name.clone()) {
                            queue.push_back(node);
                        }
                    }
                    None => unindexed_base = Some(base.clone()),
                }
            }
        }
        match unindexed_base {
            Some(base) => Ok(MemberSearch::UnindexedBase(base)),
            None => Ok(MemberSearch::Missing { candidates }),
        }
    }

    /// Resolve a type name as written to an indexed Class node. Dotted names
    /// get an exact lookup; bare names a simple-name search. Anything not a
    /// plain dotted identifier (subscripts, unions) resolves to nothing.
    async fn class_by_type_name(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<GraphNode>> {
        let name = name.trim();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Ok(None);
        }
        if name.contains('.') {
            return Ok(self
                .store
                .lookup(namespace, name)
                .await?
                .filter(|n| n.kind == SymbolKind::Class));
        }
        let hits = self.store.find_by_name(namespace, name).await?;
        Ok(hits.into_iter().find(|n| n.kind == SymbolKind::Class))
    }

    async fn attribute_class(
        &self,
        namespace: &str,
        attribute: &GraphNode,
    ) -> Result<Option<GraphNode>> {
        match &attribute.type_annotation {
            Some(ty) => self.class_by_type_name(namespace, ty).await,
            None => Ok(None),
        }
    }

    fn unknown_symbol(
        &self,
        call: &CallSite,
        reason: String,
        missing: &str,
        candidates: Vec<String>,
    ) -> Finding {
        let suggestions = closest_matches(
            missing,
            &candidates,
            self.settings.fuzzy_max_distance,
            self.settings.max_suggestions,
        );
        if !suggestions.is_empty() {
            warn!(
                "'{}' not found; closest indexed names: {}",
                missing,
                suggestions.join(", ")
            );
        }
        finding(call, Verdict::UnknownSymbol, Some(reason), suggestions)
    }

    // ---- script-local validation -------------------------------------

    /// Targets defined by the script itself are checked against the parsed
    /// script structure; the graph is never consulted for them.
    fn validate_local(
        &self,
        script: &ParsedModule,
        call: &CallSite,
        target: &ResolvedTarget,
    ) -> Finding {
        let qualified = &target.qualified_name;
        if let Some(function) = script.functions.iter().find(|f| f.qualified_name == *qualified) {
            if call.uses_unpacking {
                return unpacking_finding(call, &function.qualified_name);
            }
            return shape_finding(call, &function.signature, false);
        }
        if let Some(class) = script.classes.iter().find(|c| c.qualified_name == *qualified) {
            return self.local_constructor(script, call, class);
        }
        if let Some((owner, member)) = qualified.rsplit_once('.') {
            if let Some(class) = script.classes.iter().find(|c| c.qualified_name == owner) {
                return self.local_member(script, call, class, member, target.via_instance);
            }
        }
        finding(
            call,
            Verdict::Unverifiable,
            Some(format!(
                "'{}' has no static definition in the script",
                call.callee_text
            )),
            Vec::new(),
        )
    }

    fn local_constructor(
        &self,
        script: &ParsedModule,
        call: &CallSite,
        class: &ClassDef,
    ) -> Finding {
        if call.uses_unpacking {
            return unpacking_finding(call, &class.qualified_name);
        }
        let mut queue = VecDeque::from([class]);
        let mut visited: HashSet<&str> = HashSet::from([class.qualified_name.as_str()]);
        let mut undefined_base: Option<&str> = None;
        while let Some(current) = queue.pop_front() {
            if let Some(init) = current.find_method("__init__") {
                return shape_finding(call, &init.signature, true);
            }
            for base in &current.bases {
                match script.classes.iter().find(|c| c.name == *base) {
                    Some(node) => {
                        if visited.insert(node.qualified_name.as_str()) {
                            queue.push_back(node);
                        }
                    }
                    None => undefined_base = Some(base),
                }
            }
        }
        if let Some(base) = undefined_base {
            return finding(
                call,
                Verdict::Unverifiable,
                Some(format!(
                    "base class '{}' of '{}' is not defined in the script; constructor not verified",
                    base, class.name
                )),
                Vec::new(),
            );
        }
        shape_finding(call, &FunctionSignature::default(), false)
    }

    fn local_member(
        &self,
        script: &ParsedModule,
        call: &CallSite,
        class: &ClassDef,
        member: &str,
        via_instance: bool,
    ) -> Finding {
        let mut queue = VecDeque::from([class]);
        let mut visited: HashSet<&str> = HashSet::from([class.qualified_name.as_str()]);
        let mut candidates: Vec<String> = Vec::new();
        let mut undefined_base: Option<&str> = None;
        while let Some(current) = queue.pop_front() {
            if let Some(method) = current.find_method(member) {
                if call.uses_unpacking {
                    return unpacking_finding(call, &method.qualified_name);
                }
                return shape_finding(call, &method.signature, via_instance);
            }
            if let Some(attribute) = current.attributes.iter().find(|a| a.name == member) {
                let target_class = attribute
                    .type_annotation
                    .as_deref()
                    .and_then(|ty| script.classes.iter().find(|c| c.name == ty));
                return match target_class {
                    Some(target_class) => self.local_constructor(script, call, target_class),
                    None => finding(
                        call,
                        Verdict::Unverifiable,
                        Some(format!(
                            "attribute '{}' has no statically known class type",
                            attribute.qualified_name
                        )),
                        Vec::new(),
                    ),
                };
            }
            candidates.extend(current.methods.iter().map(|m| m.name.clone()));
            candidates.extend(current.attributes.iter().map(|a| a.name.clone()));
            for base in &current.bases {
                match script.classes.iter().find(|c| c.name == *base) {
                    Some(node) => {
                        if visited.insert(node.qualified_name.as_str()) {
                            queue.push_back(node);
                        }
                    }
                    None => undefined_base = Some(base),
                }
            }
        }
        if let Some(base) = undefined_base {
            return finding(
                call,
                Verdict::Unverifiable,
                Some(format!(
                    "'{}' not found on class '{}' and base class '{}' is not defined in the script",
                    member, class.name, base
                )),
                Vec::new(),
            );
        }
        self.unknown_symbol(
            call,
            format!("class '{}' has no member '{}'", class.name, member),
            member,
            candidates,
        )
    }
}

fn finding(
    call: &CallSite,
    verdict: Verdict,
    reason: Option<String>,
    suggestions: Vec<String>,
) -> Finding {
    Finding {
        line: call.line,
        callee_text: call.callee_text.clone(),
        verdict,
        reason,
        suggestions,
    }
}

fn unpacking_finding(call: &CallSite, qualified: &str) -> Finding {
    finding(
        call,
        Verdict::Unverifiable,
        Some(format!(
            "'{}' exists, but argument unpacking prevents a signature check",
            qualified
        )),
        Vec::new(),
    )
}

fn shape_finding(call: &CallSite, signature: &FunctionSignature, skip_receiver: bool) -> Finding {
    match check_shape(signature, call, skip_receiver) {
        Some(reason) => finding(call, Verdict::SignatureMismatch, Some(reason), Vec::new()),
        None => finding(call, Verdict::Valid, None, Vec::new()),
    }
}

/// Pure argument-shape check of one call against one declared signature.
/// `skip_receiver` drops the leading `self`/`cls` parameter for calls that
/// bind the receiver implicitly; `@staticmethod` signatures have none to
/// drop. Returns the first incompatibility found, in a fixed order: arity,
/// unknown keyword, missing required, then literal-vs-annotation.
pub fn check_shape(
    signature: &FunctionSignature,
    call: &CallSite,
    skip_receiver: bool,
) -> Option<String> {
    let is_static = signature.decorators.iter().any(|d| d == "staticmethod");
    let skip = usize::from(skip_receiver && !is_static);
    let declared: Vec<&Param> = signature.params.iter().skip(skip).collect();
    let has_var_positional = declared.iter().any(|p| p.is_variadic);
    let has_var_keyword = declared.iter().any(|p| p.is_keyword_variadic);
    let positional: Vec<&Param> = declared
        .iter()
        .copied()
        .filter(|p| !p.is_variadic && !p.is_keyword_variadic)
        .collect();

    if call.positional_count > positional.len() && !has_var_positional {
        return Some(format!(
            "too many positional arguments: {} passed, {} accepted",
            call.positional_count,
            positional.len()
        ));
    }
    for name in &call.keyword_names {
        if !has_var_keyword && !positional.iter().any(|p| &p.name == name) {
            return Some(format!("unknown keyword argument '{}'", name));
        }
    }
    for (index, param) in positional.iter().enumerate() {
        if param.is_required()
            && index >= call.positional_count
            && !call.keyword_names.iter().any(|k| k == &param.name)
        {
            return Some(format!("missing required argument '{}'", param.name));
        }
    }
    for (index, literal) in call.positional_literals.iter().enumerate() {
        let param = match positional.get(index) {
            Some(param) => param,
            None => break,
        };
        if let Some(reason) = literal_conflict(param, *literal) {
            return Some(reason);
        }
    }
    for (name, literal) in call.keyword_names.iter().zip(&call.keyword_literals) {
        if let Some(param) = positional.iter().find(|p| &p.name == name) {
            if let Some(reason) = literal_conflict(param, *literal) {
                return Some(reason);
            }
        }
    }
    None
}

/// Conservative literal-vs-annotation comparison. Only flat builtin
/// annotations and statically obvious literals participate; numeric
/// widening and bool-for-int are accepted.
fn literal_conflict(param: &Param, literal: LiteralKind) -> Option<String> {
    let annotation = param.annotation.as_deref()?.trim();
    if !CHECKED_ANNOTATIONS.contains(&annotation) {
        return None;
    }
    let compatible = matches!(
        (annotation, literal),
        (_, LiteralKind::Unknown | LiteralKind::NoneLit)
            | ("str", LiteralKind::Str)
            | ("int", LiteralKind::Int | LiteralKind::Bool)
            | ("float", LiteralKind::Float | LiteralKind::Int | LiteralKind::Bool)
            | ("bool", LiteralKind::Bool)
            | ("list", LiteralKind::List)
            | ("dict", LiteralKind::Dict)
            | ("set", LiteralKind::Set)
            | ("tuple", LiteralKind::Tuple)
    );
    if compatible {
        None
    } else {
        Some(format!(
            "argument '{}' expects {}, got {} literal",
            param.name,
            annotation,
            literal.type_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcheck_core::EdgeKind;
    use graphcheck_graph::MemoryGraphStore;

    fn sig(params: Vec<Param>) -> FunctionSignature {
        FunctionSignature {
            params,
            ..FunctionSignature::default()
        }
    }

    fn defaulted(name: &str) -> Param {
        Param {
            has_default: true,
            default_repr: Some("1".to_string()),
            ..Param::positional(name)
        }
    }

    fn call(positional: usize, keywords: &[&str]) -> CallSite {
        CallSite {
            callee_text: "f".to_string(),
            resolved: None,
            positional_count: positional,
            keyword_names: keywords.iter().map(|s| s.to_string()).collect(),
            positional_literals: vec![LiteralKind::Unknown; positional],
            keyword_literals: vec![LiteralKind::Unknown; keywords.len()],
            uses_unpacking: false,
            line: 1,
        }
    }

    #[test]
    fn shape_check_boundary_cases() {
        // def f(self, a, b=1)
        let signature = sig(vec![
            Param::positional("self"),
            Param::positional("a"),
            defaulted("b"),
        ]);

        assert_eq!(check_shape(&signature, &call(1, &[]), true), None);
        assert_eq!(
            check_shape(&signature, &call(3, &[]), true),
            Some("too many positional arguments: 3 passed, 2 accepted".to_string())
        );
        assert_eq!(
            check_shape(&signature, &call(0, &["a", "c"]), true),
            Some("unknown keyword argument 'c'".to_string())
        );
        assert_eq!(
            check_shape(&signature, &call(0, &[]), true),
            Some("missing required argument 'a'".to_string())
        );
    }

    #[test]
    fn variadics_absorb_extra_arguments() {
        let signature = sig(vec![
            Param::positional("a"),
            Param {
                is_variadic: true,
                ..Param::positional("args")
            },
            Param {
                is_keyword_variadic: true,
                ..Param::positional("kwargs")
            },
        ]);
        assert_eq!(check_shape(&signature, &call(5, &[]), false), None);
        assert_eq!(check_shape(&signature, &call(1, &["anything"]), false), None);
    }

    #[test]
    fn receiver_skip_respects_staticmethod() {
        let mut signature = sig(vec![Param::positional("a")]);
        signature.decorators.push("staticmethod".to_string());
        // One positional fills `a`; nothing is skipped.
        assert_eq!(check_shape(&signature, &call(1, &[]), true), None);
        assert_eq!(
            check_shape(&signature, &call(2, &[]), true),
            Some("too many positional arguments: 2 passed, 1 accepted".to_string())
        );
    }

    #[test]
    fn unbound_class_call_keeps_the_receiver_slot() {
        // Foo.bar(instance, 1) passes self explicitly.
        let signature = sig(vec![Param::positional("self"), Param::positional("a")]);
        assert_eq!(check_shape(&signature, &call(2, &[]), false), None);
        assert_eq!(
            check_shape(&signature, &call(3, &[]), false),
            Some("too many positional arguments: 3 passed, 2 accepted".to_string())
        );
    }

    #[test]
    fn literal_annotations_catch_obvious_type_errors() {
        let signature = sig(vec![Param {
            annotation: Some("int".to_string()),
            ..Param::positional("limit")
        }]);

        let mut bad = call(1, &[]);
        bad.positional_literals = vec![LiteralKind::Str];
        assert_eq!(
            check_shape(&signature, &bad, false),
            Some("argument 'limit' expects int, got str literal".to_string())
        );

        let mut widened = call(1, &[]);
        widened.positional_literals = vec![LiteralKind::Bool];
        assert_eq!(check_shape(&signature, &widened, false), None);

        let float_sig = sig(vec![Param {
            annotation: Some("float".to_string()),
            ..Param::positional("ratio")
        }]);
        let mut int_for_float = call(1, &[]);
        int_for_float.positional_literals = vec![LiteralKind::Int];
        assert_eq!(check_shape(&float_sig, &int_for_float, false), None);
    }

    #[test]
    fn keyword_literals_are_checked_against_their_parameter() {
        let signature = sig(vec![Param {
            annotation: Some("int".to_string()),
            ..defaulted("limit")
        }]);
        let mut bad = call(0, &["limit"]);
        bad.keyword_literals = vec![LiteralKind::List];
        assert_eq!(
            check_shape(&signature, &bad, false),
            Some("argument 'limit' expects int, got list literal".to_string())
        );
    }

    // ---- graph-backed paths over an in-memory store ------------------

    fn method(class: &str, name: &str, params: Vec<Param>) -> GraphNode {
        GraphNode::new(format!("{}.{}", class, name), name, SymbolKind::Method)
            .with_parent(class, EdgeKind::HasMethod)
            .with_signature(sig(params))
    }

    async fn seeded_store() -> Arc<dyn GraphStore> {
        let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
        let nodes = vec![
            GraphNode::new("pkg.mod", "mod", SymbolKind::File),
            GraphNode::new("pkg.mod.Base", "Base", SymbolKind::Class)
                .with_parent("pkg.mod", EdgeKind::Defines),
            method(
                "pkg.mod.Base",
                "ping",
                vec![Param::positional("self")],
            ),
            GraphNode::new("pkg.mod.Foo", "Foo", SymbolKind::Class)
                .with_parent("pkg.mod", EdgeKind::Defines)
                .with_bases(vec!["Base".to_string()]),
            method(
                "pkg.mod.Foo",
                "__init__",
                vec![Param::positional("self"), Param::positional("host")],
            ),
            method(
                "pkg.mod.Foo",
                "bar",
                vec![Param::positional("self"), Param::positional("x")],
            ),
            GraphNode::new("pkg.mod.Foo.handler", "handler", SymbolKind::Attribute)
                .with_parent("pkg.mod.Foo", EdgeKind::HasAttribute)
                .with_type_annotation("Base"),
            GraphNode::new("pkg.mod.Mystery", "Mystery", SymbolKind::Class)
                .with_parent("pkg.mod", EdgeKind::Defines)
                .with_bases(vec!["thirdparty.Widget".to_string()]),
        ];
        store.upsert_nodes("repo", nodes).await.unwrap();
        store
    }

    fn imported_call(qualified: &str, via_instance: bool, positional: usize) -> CallSite {
        let mut site = call(positional, &[]);
        site.callee_text = qualified.to_string();
        site.resolved = Some(ResolvedTarget {
            qualified_name: qualified.to_string(),
            scope: TargetScope::Imported,
            via_instance,
        });
        site
    }

    fn empty_script() -> ParsedModule {
        ParsedModule {
            module_path: "__main__".to_string(),
            file_path: "<script>".to_string(),
            imports: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn inherited_members_validate_through_indexed_bases() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![imported_call("pkg.mod.Foo.ping", true, 0)];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings[0].verdict, Verdict::Valid);
    }

    #[tokio::test]
    async fn missing_member_reports_unknown_symbol_with_suggestions() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![imported_call("pkg.mod.Foo.baz", true, 1)];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings[0].verdict, Verdict::UnknownSymbol);
        assert!(findings[0].suggestions.contains(&"bar".to_string()));
    }

    #[tokio::test]
    async fn unindexed_base_is_unverifiable_not_unknown() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![imported_call("pkg.mod.Mystery.anything", true, 0)];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings[0].verdict, Verdict::Unverifiable);
    }

    #[tokio::test]
    async fn constructor_checks_init_arity() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let ok = vec![imported_call("pkg.mod.Foo", false, 1)];
        let findings = validator.validate("repo", &empty_script(), &ok).await;
        assert_eq!(findings[0].verdict, Verdict::Valid);

        let bad = vec![imported_call("pkg.mod.Foo", false, 3)];
        let findings = validator.validate("repo", &empty_script(), &bad).await;
        assert_eq!(findings[0].verdict, Verdict::SignatureMismatch);
    }

    #[tokio::test]
    async fn class_without_init_checks_as_zero_parameter_constructor() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let ok = vec![imported_call("pkg.mod.Base", false, 0)];
        let findings = validator.validate("repo", &empty_script(), &ok).await;
        assert_eq!(findings[0].verdict, Verdict::Valid);

        let bad = vec![imported_call("pkg.mod.Base", false, 2)];
        let findings = validator.validate("repo", &empty_script(), &bad).await;
        assert_eq!(findings[0].verdict, Verdict::SignatureMismatch);
    }

    #[tokio::test]
    async fn attribute_chain_retargets_through_recorded_type() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![imported_call("pkg.mod.Foo.handler.ping", true, 0)];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings[0].verdict, Verdict::Valid);
    }

    #[tokio::test]
    async fn unindexed_import_roots_are_unverifiable() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![imported_call("os.path.join", false, 2)];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings[0].verdict, Verdict::Unverifiable);
    }

    #[tokio::test]
    async fn findings_come_back_in_input_order() {
        let validator = KnowledgeGraphValidator::new(seeded_store().await);
        let calls = vec![
            imported_call("pkg.mod.Foo.bar", true, 1),
            imported_call("pkg.mod.Foo.baz", true, 1),
            imported_call("os.getcwd", false, 0),
        ];
        let findings = validator.validate("repo", &empty_script(), &calls).await;
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].verdict, Verdict::Valid);
        assert_eq!(findings[1].verdict, Verdict::UnknownSymbol);
        assert_eq!(findings[2].verdict, Verdict::Unverifiable);
    }
}
