use alloc::string::String;
use core::any::TypeId;

use crate::hash::{HashMap, HashSet};
use crate::info::{Bindable, TypeDescriptor};
use crate::value::Type;

// -----------------------------------------------------------------------------
// TypeTable

/// A registry of [`TypeDescriptor`]s, keyed by [`TypeId`] and indexed by
/// full type path and by short type name.
///
/// Short names that belong to more than one registered type are tracked as
/// ambiguous and never resolve.
///
/// # Examples
///
/// ```
/// use vc_bind::info::TypeTable;
///
/// let table = TypeTable::new();
///
/// let desc = table.get_with_type_name("String").unwrap();
/// assert!(desc.ty().is::<String>());
/// assert!(table.get_with_type_path("alloc::string::String").is_some());
/// ```
pub struct TypeTable {
    descriptors: HashMap<TypeId, TypeDescriptor>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<String, TypeId>,
    ambiguous_names: HashSet<String>,
}

impl Default for TypeTable {
    /// See [`TypeTable::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Creates an empty [`TypeTable`].
    #[inline]
    pub fn empty() -> Self {
        Self {
            descriptors: HashMap::default(),
            type_path_to_id: HashMap::default(),
            type_name_to_id: HashMap::default(),
            ambiguous_names: HashSet::default(),
        }
    }

    /// Creates a table with the primitive types registered.
    ///
    /// - `()` `bool` `char`
    /// - `i8 - i128` `isize`
    /// - `u8 - u128` `usize`
    /// - `f32` `f64`
    /// - `String`
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.register::<()>();
        table.register::<bool>();
        table.register::<char>();
        table.register::<u8>();
        table.register::<u16>();
        table.register::<u32>();
        table.register::<u64>();
        table.register::<u128>();
        table.register::<usize>();
        table.register::<i8>();
        table.register::<i16>();
        table.register::<i32>();
        table.register::<i64>();
        table.register::<i128>();
        table.register::<isize>();
        table.register::<f32>();
        table.register::<f64>();
        table.register::<String>();
        table
    }

    // The type must **not** already exist.
    fn add_new_type_indices(
        ty: Type,
        type_path_to_id: &mut HashMap<&'static str, TypeId>,
        type_name_to_id: &mut HashMap<String, TypeId>,
        ambiguous_names: &mut HashSet<String>,
    ) {
        let type_name = ty.short_name();

        if !ambiguous_names.contains(&type_name) {
            if type_name_to_id.contains_key(&type_name) {
                type_name_to_id.remove(&type_name);
                ambiguous_names.insert(type_name);
            } else {
                type_name_to_id.insert(type_name, ty.id());
            }
        }

        type_path_to_id.insert(ty.path(), ty.id());
    }

    /// Inserts `descriptor` unless its type is already present.
    ///
    /// Returns `true` if it was inserted. Dependencies are *not* registered;
    /// use [`register`](Self::register) for that.
    pub fn try_insert(&mut self, descriptor: TypeDescriptor) -> bool {
        let id = descriptor.ty().id();
        if self.descriptors.contains_key(&id) {
            return false;
        }
        Self::add_new_type_indices(
            descriptor.ty(),
            &mut self.type_path_to_id,
            &mut self.type_name_to_id,
            &mut self.ambiguous_names,
        );
        self.descriptors.insert(id, descriptor);
        true
    }

    /// Inserts or **overwrites** the descriptor of its type.
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        let id = descriptor.ty().id();
        if !self.descriptors.contains_key(&id) {
            Self::add_new_type_indices(
                descriptor.ty(),
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
        }
        self.descriptors.insert(id, descriptor);
    }

    /// Registers `T` and, recursively, every type its descriptor depends on.
    ///
    /// Already registered types are skipped together with their
    /// dependencies, so recursive types terminate.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_bind::{Bindable, info::TypeTable};
    ///
    /// #[derive(Bindable, Clone)]
    /// struct Team {
    ///     scores: Vec<Option<u8>>,
    /// }
    ///
    /// let mut table = TypeTable::empty();
    /// table.register::<Team>();
    ///
    /// assert!(table.contains_of::<Vec<Option<u8>>>());
    /// assert!(table.contains_of::<Option<u8>>());
    /// assert!(table.contains_of::<u8>());
    /// ```
    pub fn register<T: Bindable>(&mut self) {
        if self.descriptors.contains_key(&TypeId::of::<T>()) {
            return;
        }
        let descriptor = T::descriptor();
        let dependencies = descriptor.dependencies.clone();
        self.try_insert(descriptor);
        for register in dependencies {
            register(self);
        }
    }

    /// Registers every non-generic type annotated with `#[bind(auto_register)]`.
    ///
    /// Repeated calls are cheap. Returns `true` if static registration is
    /// supported on this platform; without the `auto_register` feature this
    /// does nothing and returns `false`.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::auto_register;
            if self.contains(TypeId::of::<auto_register::__AvailFlag>()) {
                return true;
            }
            auto_register::__register_types(self);
            self.contains(TypeId::of::<auto_register::__AvailFlag>())
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Returns `true` if the type is registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.descriptors.contains_key(&type_id)
    }

    /// Returns `true` if `T` is registered.
    #[inline]
    pub fn contains_of<T: 'static>(&self) -> bool {
        self.contains(TypeId::of::<T>())
    }

    /// Returns the descriptor of a type.
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.descriptors.get(&type_id)
    }

    /// Returns the descriptor of `T`.
    #[inline]
    pub fn get_of<T: 'static>(&self) -> Option<&TypeDescriptor> {
        self.get(TypeId::of::<T>())
    }

    /// Returns the descriptor of the type with the given full path.
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeDescriptor> {
        self.type_path_to_id
            .get(type_path)
            .and_then(|id| self.get(*id))
    }

    /// Returns the descriptor of the type with the given short name,
    /// unless the name is ambiguous.
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.type_name_to_id
            .get(type_name)
            .and_then(|id| self.get(*id))
    }

    /// Returns `true` if more than one registered type has this short name.
    #[inline]
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    /// Iterates all descriptors in no particular order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.values()
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeTable;
    use crate::info::{Bindable, DescriptorBuilder, TypeDescriptor};

    mod a {
        #[derive(Clone)]
        pub struct Twin;
    }

    mod b {
        #[derive(Clone)]
        pub struct Twin;
    }

    impl Bindable for a::Twin {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new().build()
        }
    }

    impl Bindable for b::Twin {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new().build()
        }
    }

    #[test]
    fn ambiguous_short_names() {
        let mut table = TypeTable::empty();
        table.register::<a::Twin>();
        assert!(table.get_with_type_name("Twin").is_some());

        table.register::<b::Twin>();
        assert!(table.is_ambiguous("Twin"));
        assert!(table.get_with_type_name("Twin").is_none());
        assert!(
            table
                .get_with_type_path(core::any::type_name::<b::Twin>())
                .is_some()
        );
    }

    #[test]
    fn register_is_idempotent() {
        let mut table = TypeTable::new();
        let before = table.len();
        table.register::<alloc::vec::Vec<f32>>();
        table.register::<alloc::vec::Vec<f32>>();
        assert_eq!(table.len(), before + 1);
    }
}
