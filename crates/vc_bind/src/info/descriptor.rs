use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{AccessError, expect_mut, expect_owned};
use crate::info::TypeTable;
use crate::value::{Semantics, Type, Value};

// -----------------------------------------------------------------------------
// Erased callables

/// Reads a value out of a container.
pub type ReadFn = Arc<dyn Fn(&dyn Value) -> Result<Box<dyn Value>, AccessError> + Send + Sync>;

/// Writes a value into a container.
pub type WriteFn =
    Arc<dyn Fn(&mut dyn Value, Box<dyn Value>) -> Result<(), AccessError> + Send + Sync>;

/// Borrows a value stored inside a container.
pub type ProjectFn =
    Arc<dyn for<'a> Fn(&'a dyn Value) -> Result<&'a dyn Value, AccessError> + Send + Sync>;

/// Mutably borrows a value stored inside a container.
pub type ProjectMutFn = Arc<
    dyn for<'a> Fn(&'a mut dyn Value) -> Result<&'a mut dyn Value, AccessError> + Send + Sync,
>;

/// Borrows the element stored under a key.
pub type KeyedProjectFn = Arc<
    dyn for<'a> Fn(&'a dyn Value, &dyn Value) -> Result<&'a dyn Value, AccessError> + Send + Sync,
>;

/// Mutably borrows the element stored under a key.
pub type KeyedProjectMutFn = Arc<
    dyn for<'a> Fn(&'a mut dyn Value, &dyn Value) -> Result<&'a mut dyn Value, AccessError>
        + Send
        + Sync,
>;

/// Borrows the element at a multi-index.
pub type ArrayProjectFn = Arc<
    dyn for<'a> Fn(&'a dyn Value, &[usize]) -> Result<&'a dyn Value, AccessError> + Send + Sync,
>;

/// Mutably borrows the element at a multi-index.
pub type ArrayProjectMutFn = Arc<
    dyn for<'a> Fn(&'a mut dyn Value, &[usize]) -> Result<&'a mut dyn Value, AccessError>
        + Send
        + Sync,
>;

/// Reads through a parametric member: indexers and methods.
pub type CallFn =
    Arc<dyn Fn(&dyn Value, &[&dyn Value]) -> Result<Box<dyn Value>, AccessError> + Send + Sync>;

/// Writes through a parametric member: indexers and methods.
pub type CallMutFn = Arc<
    dyn Fn(&mut dyn Value, &[&dyn Value], Box<dyn Value>) -> Result<(), AccessError> + Send + Sync,
>;

/// Callback handed to [`VisitFn`].
pub type Visitor<'v> = dyn FnMut(&dyn Value) -> Result<(), AccessError> + 'v;

/// Callback handed to [`VisitMutFn`].
pub type VisitorMut<'v> = dyn FnMut(&mut dyn Value) -> Result<(), AccessError> + 'v;

/// Lends a value that cannot be returned by reference, e.g. one behind a lock.
pub type VisitFn =
    Arc<dyn Fn(&dyn Value, &mut Visitor<'_>) -> Result<(), AccessError> + Send + Sync>;

/// Mutable counterpart of [`VisitFn`].
///
/// The container is only borrowed shared: exclusivity comes from the lock
/// behind it.
pub type VisitMutFn =
    Arc<dyn Fn(&dyn Value, &mut VisitorMut<'_>) -> Result<(), AccessError> + Send + Sync>;

/// Converts a value of one type into a value of another.
pub type ConvertFn =
    Arc<dyn Fn(&dyn Value) -> Result<Box<dyn Value>, AccessError> + Send + Sync>;

/// Consumes a value of one type and wraps it into another.
pub type WidenFn =
    Arc<dyn Fn(Box<dyn Value>) -> Result<Box<dyn Value>, AccessError> + Send + Sync>;

/// Moves a boxed value into a slot of the same type.
pub type AssignFn = fn(&mut dyn Value, Box<dyn Value>) -> Result<(), AccessError>;

/// Builds the default value of a type.
pub type DefaultFn = fn() -> Box<dyn Value>;

/// Returns a key identifying the instance a value refers to.
pub type IdentityFn = fn(&dyn Value) -> usize;

// Closures only get higher-ranked signatures when inferred against a bound,
// so every erased callable is created through one of these.

#[inline]
pub(crate) fn project_fn<F>(f: F) -> ProjectFn
where
    F: for<'a> Fn(&'a dyn Value) -> Result<&'a dyn Value, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn project_mut_fn<F>(f: F) -> ProjectMutFn
where
    F: for<'a> Fn(&'a mut dyn Value) -> Result<&'a mut dyn Value, AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn keyed_fn<F>(f: F) -> KeyedProjectFn
where
    F: for<'a> Fn(&'a dyn Value, &dyn Value) -> Result<&'a dyn Value, AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn keyed_mut_fn<F>(f: F) -> KeyedProjectMutFn
where
    F: for<'a> Fn(&'a mut dyn Value, &dyn Value) -> Result<&'a mut dyn Value, AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn array_fn<F>(f: F) -> ArrayProjectFn
where
    F: for<'a> Fn(&'a dyn Value, &[usize]) -> Result<&'a dyn Value, AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn array_mut_fn<F>(f: F) -> ArrayProjectMutFn
where
    F: for<'a> Fn(&'a mut dyn Value, &[usize]) -> Result<&'a mut dyn Value, AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn visit_fn<F>(f: F) -> VisitFn
where
    F: Fn(&dyn Value, &mut Visitor<'_>) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn visit_mut_fn<F>(f: F) -> VisitMutFn
where
    F: Fn(&dyn Value, &mut VisitorMut<'_>) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn read_fn<F>(f: F) -> ReadFn
where
    F: Fn(&dyn Value) -> Result<Box<dyn Value>, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn convert_fn<F>(f: F) -> ConvertFn
where
    F: Fn(&dyn Value) -> Result<Box<dyn Value>, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn write_fn<F>(f: F) -> WriteFn
where
    F: Fn(&mut dyn Value, Box<dyn Value>) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn call_fn<F>(f: F) -> CallFn
where
    F: Fn(&dyn Value, &[&dyn Value]) -> Result<Box<dyn Value>, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn call_mut_fn<F>(f: F) -> CallMutFn
where
    F: Fn(&mut dyn Value, &[&dyn Value], Box<dyn Value>) -> Result<(), AccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn widen_fn<F>(f: F) -> WidenFn
where
    F: Fn(Box<dyn Value>) -> Result<Box<dyn Value>, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// [`AssignFn`] for `T`.
pub(crate) fn assign_value<T: Value>(
    slot: &mut dyn Value,
    value: Box<dyn Value>,
) -> Result<(), AccessError> {
    let value = expect_owned::<T>(value)?;
    *expect_mut::<T>(slot)? = value;
    Ok(())
}

/// [`DefaultFn`] for `T`.
pub(crate) fn default_value<T: Value + Default>() -> Box<dyn Value> {
    Box::new(T::default())
}

/// [`IdentityFn`] that uses the address of the value itself.
pub(crate) fn address_identity(value: &dyn Value) -> usize {
    core::ptr::from_ref(value).cast::<()>().addr()
}

// -----------------------------------------------------------------------------
// Capabilities

/// Whether a member stores its value or computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Stored in the container; reachable by reference.
    Field,
    /// Produced by a getter and consumed by a setter.
    Property,
}

/// A named field or property.
#[derive(Clone)]
pub struct MemberInfo {
    pub(crate) name: &'static str,
    pub(crate) kind: MemberKind,
    pub(crate) value_type: Type,
    pub(crate) project: Option<ProjectFn>,
    pub(crate) project_mut: Option<ProjectMutFn>,
    pub(crate) read: Option<ReadFn>,
    pub(crate) write: Option<WriteFn>,
}

impl MemberInfo {
    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns whether this is a field or a property.
    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Returns the type of the member value.
    #[inline]
    pub fn value_type(&self) -> Type {
        self.value_type
    }

    /// Returns `true` if the member can be read.
    #[inline]
    pub fn can_read(&self) -> bool {
        self.project.is_some() || self.read.is_some()
    }

    /// Returns `true` if the member can be written.
    #[inline]
    pub fn can_write(&self) -> bool {
        self.project_mut.is_some() || self.write.is_some()
    }
}

/// A declared indexer, e.g. `grid[x, y]`.
#[derive(Clone)]
pub struct IndexerInfo {
    pub(crate) params: Box<[Type]>,
    pub(crate) value_type: Type,
    pub(crate) read: Option<CallFn>,
    pub(crate) write: Option<CallMutFn>,
}

impl IndexerInfo {
    /// Returns the key parameter types.
    #[inline]
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// Returns the type of the indexed value.
    #[inline]
    pub fn value_type(&self) -> Type {
        self.value_type
    }
}

/// A method reachable by `name(T1, T2)` paths.
///
/// `params` lists every parameter in declaration order, including the main
/// parameter when the method has one. Only the other parameters become
/// parameter slots of the resolved node; the main parameter receives the
/// value being written.
#[derive(Clone)]
pub struct MethodInfo {
    pub(crate) name: &'static str,
    pub(crate) params: Box<[Type]>,
    pub(crate) main: Option<usize>,
    pub(crate) value_type: Type,
    pub(crate) read: Option<CallFn>,
    pub(crate) write: Option<CallMutFn>,
}

impl MethodInfo {
    /// Returns the method name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns every parameter type, main parameter included.
    #[inline]
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// Returns the position of the main parameter.
    #[inline]
    pub fn main(&self) -> Option<usize> {
        self.main
    }

    /// Returns the type produced by reads or consumed by writes.
    #[inline]
    pub fn value_type(&self) -> Type {
        self.value_type
    }

    /// Returns the types of the parameters that are bound by slots.
    pub(crate) fn arg_types(&self) -> impl Iterator<Item = Type> + '_ {
        self.params
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.main)
            .map(|(_, ty)| *ty)
    }
}

/// Which collection protocol an [`ElementInfo`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Integer keyed.
    List,
    /// Keyed by any value.
    Map,
}

/// Element access of a list or dictionary.
#[derive(Clone)]
pub struct ElementInfo {
    pub(crate) kind: ElementKind,
    pub(crate) key: Type,
    pub(crate) value: Type,
    pub(crate) get: KeyedProjectFn,
    pub(crate) get_mut: KeyedProjectMutFn,
}

/// Number of indices an array level consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayRank {
    /// Always the given number of indices.
    Fixed(usize),
    /// Every remaining index; the instance checks the count.
    Dynamic,
}

/// Raw element access of an array.
#[derive(Clone)]
pub struct ArrayInfo {
    pub(crate) rank: ArrayRank,
    pub(crate) element: Type,
    pub(crate) get: ArrayProjectFn,
    pub(crate) get_mut: ArrayProjectMutFn,
}

/// A transparent wrapper whose members are looked up on the inner type.
#[derive(Clone)]
pub enum WrapperInfo {
    /// `Option<T>`: unwrapping `None` fails.
    Optional {
        inner: Type,
        get: ProjectFn,
        get_mut: ProjectMutFn,
        wrap: WriteFn,
    },
    /// `Shared<T>`: the inner value lives behind a lock.
    Shared {
        inner: Type,
        visit: VisitFn,
        visit_mut: VisitMutFn,
    },
}

impl WrapperInfo {
    /// Returns the wrapped type.
    #[inline]
    pub fn inner(&self) -> Type {
        match self {
            Self::Optional { inner, .. } | Self::Shared { inner, .. } => *inner,
        }
    }
}

/// A narrowing from this type to `sub`, e.g. an enum to a variant payload.
#[derive(Clone)]
pub struct NarrowInfo {
    pub(crate) name: &'static str,
    pub(crate) sub: Type,
    pub(crate) get: ProjectFn,
    pub(crate) get_mut: ProjectMutFn,
    pub(crate) widen: WidenFn,
}

impl NarrowInfo {
    /// Returns the variant (or view) name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the narrowed type.
    #[inline]
    pub fn sub(&self) -> Type {
        self.sub
    }
}

/// A type that stands for a value of another type.
#[derive(Clone)]
pub struct ValueProviderInfo {
    pub(crate) value: Type,
    pub(crate) get: ConvertFn,
    pub(crate) wrap: Option<ConvertFn>,
}

/// Unit variants of an enum, by name and discriminant.
#[derive(Clone)]
pub struct VariantTable {
    pub(crate) variants: &'static [(&'static str, i64)],
    pub(crate) index_of: Arc<dyn Fn(&dyn Value) -> Option<usize> + Send + Sync>,
    pub(crate) from_index: Arc<dyn Fn(usize) -> Option<Box<dyn Value>> + Send + Sync>,
}

impl VariantTable {
    /// Returns the variant names and discriminants in declaration order.
    #[inline]
    pub fn variants(&self) -> &'static [(&'static str, i64)] {
        self.variants
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<Box<dyn Value>> {
        let index = self
            .variants
            .iter()
            .position(|(n, _)| *n == name)
            .or_else(|| {
                self.variants
                    .iter()
                    .position(|(n, _)| n.eq_ignore_ascii_case(name))
            })?;
        (self.from_index)(index)
    }

    pub(crate) fn by_discriminant(&self, discriminant: i64) -> Option<Box<dyn Value>> {
        let index = self.variants.iter().position(|(_, d)| *d == discriminant)?;
        (self.from_index)(index)
    }

    pub(crate) fn name_of(&self, value: &dyn Value) -> Option<&'static str> {
        (self.index_of)(value).and_then(|i| self.variants.get(i)).map(|(n, _)| *n)
    }

    pub(crate) fn discriminant_of(&self, value: &dyn Value) -> Option<i64> {
        (self.index_of)(value).and_then(|i| self.variants.get(i)).map(|(_, d)| *d)
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Everything the resolver knows about one type.
///
/// Created through [`DescriptorBuilder`](crate::info::DescriptorBuilder),
/// usually by `#[derive(Bindable)]`, and stored in a [`TypeTable`].
#[derive(Clone)]
pub struct TypeDescriptor {
    pub(crate) ty: Type,
    pub(crate) semantics: Semantics,
    pub(crate) assign: AssignFn,
    pub(crate) members: Vec<MemberInfo>,
    pub(crate) indexers: Vec<IndexerInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) element: Option<ElementInfo>,
    pub(crate) array: Option<ArrayInfo>,
    pub(crate) wrapper: Option<WrapperInfo>,
    pub(crate) narrowings: Vec<NarrowInfo>,
    pub(crate) value_provider: Option<ValueProviderInfo>,
    pub(crate) variants: Option<VariantTable>,
    pub(crate) default: Option<DefaultFn>,
    pub(crate) identity: IdentityFn,
    pub(crate) dependencies: Vec<fn(&mut TypeTable)>,
}

impl TypeDescriptor {
    /// Returns the described type.
    #[inline]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Returns how values of this type behave when read out of a container.
    #[inline]
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Returns the declared fields and properties.
    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Returns the declared indexers.
    #[inline]
    pub fn indexers(&self) -> &[IndexerInfo] {
        &self.indexers
    }

    /// Returns the declared methods.
    #[inline]
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Returns the declared narrowings.
    #[inline]
    pub fn narrowings(&self) -> &[NarrowInfo] {
        &self.narrowings
    }

    /// Returns the wrapper capability, for `Option<T>` and `Shared<T>`.
    #[inline]
    pub fn wrapper(&self) -> Option<&WrapperInfo> {
        self.wrapper.as_ref()
    }

    /// Returns the enum variant table, for unit enums.
    #[inline]
    pub fn variants(&self) -> Option<&VariantTable> {
        self.variants.as_ref()
    }

    /// Returns `true` if list or dictionary elements can be addressed.
    #[inline]
    pub fn has_elements(&self) -> bool {
        self.element.is_some()
    }

    /// Returns `true` if raw array elements can be addressed.
    #[inline]
    pub fn has_array(&self) -> bool {
        self.array.is_some()
    }

    /// Creates the registered default value, if any.
    #[inline]
    pub fn default_value(&self) -> Option<Box<dyn Value>> {
        self.default.map(|f| f())
    }

    /// Looks up a field or property by name.
    ///
    /// Candidates are tried in order: exact match, case-insensitive match,
    /// match after stripping the conventional `_` and `m_` prefixes, and
    /// finally the name with its first letter case inverted.
    pub fn find_member(&self, name: &str) -> Option<&MemberInfo> {
        let members = &self.members;
        if let Some(m) = members.iter().find(|m| m.name == name) {
            return Some(m);
        }
        if let Some(m) = members.iter().find(|m| m.name.eq_ignore_ascii_case(name)) {
            return Some(m);
        }
        let stripped = strip_prefixes(name);
        if let Some(m) = members
            .iter()
            .find(|m| strip_prefixes(m.name).eq_ignore_ascii_case(stripped))
        {
            return Some(m);
        }
        let inverted = invert_first(stripped);
        members
            .iter()
            .find(|m| strip_prefixes(m.name) == inverted)
    }

    /// Returns the methods called `name`, matched like [`find_member`](Self::find_member)
    /// but without prefix stripping.
    pub fn find_methods<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        let exact = self.methods.iter().any(|m| m.name == name);
        self.methods.iter().filter(move |m| {
            if exact {
                m.name == name
            } else {
                m.name.eq_ignore_ascii_case(name)
            }
        })
    }

    /// Returns the narrowing whose sub type is `sub`.
    #[inline]
    pub fn narrowing_to(&self, sub: Type) -> Option<&NarrowInfo> {
        self.narrowings.iter().find(|n| n.sub == sub)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("ty", &self.ty)
            .field("semantics", &self.semantics)
            .field(
                "members",
                &self.members.iter().map(|m| m.name).collect::<Vec<_>>(),
            )
            .field("indexers", &self.indexers.len())
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn strip_prefixes(name: &str) -> &str {
    name.strip_prefix("m_")
        .or_else(|| name.strip_prefix('_'))
        .unwrap_or(name)
}

fn invert_first(name: &str) -> alloc::string::String {
    let mut chars = name.chars();
    let mut out = alloc::string::String::with_capacity(name.len());
    if let Some(first) = chars.next() {
        if first.is_uppercase() {
            out.extend(first.to_lowercase());
        } else {
            out.extend(first.to_uppercase());
        }
    }
    out.push_str(chars.as_str());
    out
}

#[cfg(test)]
mod tests {
    use super::{invert_first, strip_prefixes};

    #[test]
    fn name_helpers() {
        assert_eq!(strip_prefixes("m_speed"), "speed");
        assert_eq!(strip_prefixes("_speed"), "speed");
        assert_eq!(strip_prefixes("speed"), "speed");
        assert_eq!(invert_first("speed"), "Speed");
        assert_eq!(invert_first("Speed"), "speed");
        assert_eq!(invert_first(""), "");
    }
}
