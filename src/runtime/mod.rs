pub mod accessor_cache;
pub mod evaluator;
pub mod interpreter;
pub mod method_cache;
pub mod type_casting;
pub mod utils;

// Re-export the main public functions
pub use accessor_cache::{AccessorCache, PropertyAccessor};
pub use evaluator::eval;
pub use interpreter::{ExpressionInterpreter, Getter, Setter, Target};
pub use method_cache::{is_supported, DelegateKind, MethodDelegate, MethodDelegateCache};
pub use type_casting::{change_type, checked_cast};
pub use utils::concat;
