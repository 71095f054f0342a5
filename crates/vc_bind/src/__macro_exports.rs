//! Items referenced by derived code. Not public API.

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::info::{Bindable, DescriptorBuilder, TypeDescriptor, TypeTable};

    /// A registration function submitted by `#[bind(auto_register)]`.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeTable));

    inventory::collect!(__AutoRegisterFunc);

    /// Registers `T` into `table`.
    pub fn __register_type<T: Bindable>(table: &mut TypeTable) {
        table.register::<T>();
    }

    /// Runs every submitted registration function.
    pub fn __register_types(table: &mut TypeTable) {
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(table);
        }
    }

    /// Present in a table after [`__register_types`] iff static
    /// registration works on this platform.
    #[derive(Clone)]
    pub struct __AvailFlag;

    impl Bindable for __AvailFlag {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new().build()
        }
    }

    inventory::submit! {
        __AutoRegisterFunc(__register_type::<__AvailFlag>)
    }
}
