//! Builtin operation descriptors.
//!
//! Every operation here is a plain factory function returning an
//! [`OperationDescriptor`](crate::descriptor::OperationDescriptor); there
//! is no operation trait to implement. Embedders compose their own
//! descriptors the same way and register them alongside these.

pub mod arithmetic;
pub mod resample;

pub use arithmetic::{
    absolute, add, add_const, divide_by_const, exp, invert, log, max, min, multiply,
    multiply_const, rescale, subtract, subtract_const,
};
pub use resample::resample;

use crate::registry::OperationRegistry;

/// Register every builtin operation on a registry.
///
/// Called by [`OperationRegistry::with_defaults`]; exposed so embedders
/// can layer the builtins onto a registry that already carries their own
/// operations.
pub fn register_defaults(registry: &OperationRegistry) {
    registry.register(add_const());
    registry.register(subtract_const());
    registry.register(multiply_const());
    registry.register(divide_by_const());
    registry.register(rescale());
    registry.register(absolute());
    registry.register(invert());
    registry.register(log());
    registry.register(exp());
    registry.register(add());
    registry.register(subtract());
    registry.register(multiply());
    registry.register(min());
    registry.register(max());
    registry.register(resample());
}
