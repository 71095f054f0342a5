//! Turning parsed segments into nodes.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::convert::ConverterRegistry;
use crate::error::ResolveError;
use crate::hash::HashMap;
use crate::info::{ElementKind, MethodInfo, TypeDescriptor, TypeTable};
use crate::node::{ExternalAccessor, Node, Param};
use crate::path::{BindingPath, Literal, Segment, SegmentKind};
use crate::provider::PathProvider;
use crate::value::Type;

pub(super) struct Builder<'r> {
    pub table: &'r TypeTable,
    pub providers: &'r HashMap<String, Arc<dyn PathProvider>>,
    pub registry: &'r ConverterRegistry,
}

impl<'r> Builder<'r> {
    /// Resolves every segment of `path`, starting at `root`.
    pub fn build(
        &self,
        root: &'r TypeDescriptor,
        path: &BindingPath,
    ) -> Result<Vec<Node>, ResolveError> {
        let mut nodes = Vec::with_capacity(path.segments().len());
        let mut current = root;
        for segment in path.segments() {
            current = self.push_segment(&mut nodes, current, segment)?;
        }
        Ok(nodes)
    }

    fn descriptor(&self, ty: Type) -> Result<&'r TypeDescriptor, ResolveError> {
        self.table
            .get(ty.id())
            .ok_or(ResolveError::UnregisteredType { ty })
    }

    /// Pushes the node of `segment`, preceded by implicit unwraps and
    /// derefs when the segment addresses the inside of a wrapper.
    fn push_segment(
        &self,
        nodes: &mut Vec<Node>,
        mut desc: &'r TypeDescriptor,
        segment: &Segment,
    ) -> Result<&'r TypeDescriptor, ResolveError> {
        loop {
            if let Some(node) = self.node(desc, segment)? {
                let next = self.descriptor(node.value_type)?;
                nodes.push(node);
                return Ok(next);
            }

            let implicit = matches!(
                segment.kind,
                SegmentKind::Member(_)
                    | SegmentKind::Method { .. }
                    | SegmentKind::Indexer(_)
                    | SegmentKind::Array(_)
            );
            match Node::wrapper(self.table, desc) {
                Some(wrap) if implicit => {
                    desc = self.descriptor(wrap.value_type)?;
                    nodes.push(wrap);
                }
                _ => {
                    return Err(ResolveError::UnresolvableSegment {
                        ty: desc.ty,
                        segment: segment.to_string(),
                    });
                }
            }
        }
    }

    /// Resolves `segment` on `desc` itself. `None` means the type has no
    /// such member.
    fn node(&self, desc: &TypeDescriptor, segment: &Segment) -> Result<Option<Node>, ResolveError> {
        let node = match &segment.kind {
            SegmentKind::This => Some(Node::this(desc)),
            SegmentKind::Member(name) => match desc.find_member(name) {
                Some(member) => Some(
                    Node::member(self.table, desc, member)
                        .ok_or(ResolveError::UnregisteredType { ty: member.value_type })?,
                ),
                None => None,
            },
            SegmentKind::Unwrap => Node::wrapper(self.table, desc),
            SegmentKind::Method { name, hints } => match select_method(desc, name, hints) {
                Some(method) => Some(
                    Node::method(self.table, desc, method, segment.to_string())
                        .ok_or(ResolveError::UnregisteredType { ty: method.value_type })?,
                ),
                None => None,
            },
            SegmentKind::Indexer(literals) => self.indexer(desc, literals, segment),
            SegmentKind::Array(literals) => {
                if desc.array.is_none() {
                    return Ok(None);
                }
                let usize_ty = Type::of::<usize>();
                let params = literals
                    .iter()
                    .map(|l| self.param(l, usize_ty))
                    .collect::<Option<Box<[_]>>>();
                params.and_then(|p| Node::array(self.table, desc.ty, p, segment.to_string()))
            }
            SegmentKind::Provider { id, path_id } => {
                let provider = self
                    .providers
                    .get(id.as_str())
                    .ok_or_else(|| ResolveError::UnregisteredProvider { id: id.clone() })?;
                let path = provider.try_convert_id_to_path(path_id).ok_or_else(|| {
                    ResolveError::Provider {
                        id: id.clone(),
                        message: alloc::format!("unknown path id `{path_id}`"),
                    }
                })?;
                let accessor: Arc<dyn ExternalAccessor> = Arc::from(provider.accessor(desc.ty, &path)?);
                let ty = accessor.value_type();
                Some(
                    Node::external(self.table, desc, accessor, segment.to_string())
                        .ok_or(ResolveError::UnregisteredType { ty })?,
                )
            }
        };
        Ok(node)
    }

    /// A declared indexer whose parameters accept the literals, otherwise
    /// a list or dictionary element.
    fn indexer(&self, desc: &TypeDescriptor, literals: &[Literal], segment: &Segment) -> Option<Node> {
        for info in desc.indexers.iter().filter(|i| i.params.len() == literals.len()) {
            let params = literals
                .iter()
                .zip(info.params.iter())
                .map(|(l, ty)| self.param(l, *ty))
                .collect::<Option<Box<[_]>>>();
            if let Some(params) = params {
                return Node::indexer(self.table, desc, info, params, segment.to_string());
            }
        }

        let element = desc.element.as_ref()?;
        let [literal] = literals else {
            return None;
        };
        // A negative list index stays signed and fails when accessed.
        if let Literal::Int(i) = literal
            && *i < 0
            && element.kind == ElementKind::List
        {
            let key = Param::Const(Box::new(*i));
            return Node::element(self.table, desc, element, key, segment.to_string());
        }
        let key = self.param(literal, element.key)?;
        Node::element(self.table, desc, element, key, segment.to_string())
    }

    /// Converts a literal into a parameter of type `ty`; `$n` stays unbound.
    fn param(&self, literal: &Literal, ty: Type) -> Option<Param> {
        match literal.to_value() {
            Some(value) => self.registry.coerce(value, ty).ok().map(Param::Const),
            None => Some(Param::Unbound),
        }
    }
}

/// Picks the overload of `name` matching the parameter type hints.
///
/// Without hints, a lone overload is taken as is; among several, the one
/// without parameters.
fn select_method<'a>(desc: &'a TypeDescriptor, name: &'a str, hints: &[String]) -> Option<&'a MethodInfo> {
    let mut candidates = desc.find_methods(name);
    if hints.is_empty() {
        let all: Vec<_> = candidates.collect();
        return match all.as_slice() {
            [only] => Some(*only),
            many => many.iter().copied().find(|m| m.params.is_empty()),
        };
    }
    candidates.find(|m| {
        m.params.len() == hints.len()
            && m.params.iter().zip(hints).all(|(ty, hint)| hint_matches(*ty, hint))
    })
}

fn hint_matches(ty: Type, hint: &str) -> bool {
    let hint = hint.trim();
    hint == ty.path() || hint.eq_ignore_ascii_case(&ty.short_name())
}
