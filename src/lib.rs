/*!
A structured-message validation engine: compiles declarative rules
attached to a schema into a tree of compiled validator nodes, then
evaluates message instances against that tree to produce precisely
located violations.

The typical entry point is [`Factory`]: register or lazily compile a
message type's rules once, then hand out cheap [`Validator`]s that reuse
the cached compilation for every message of that type.

```ignore
let factory = Factory::new();
let validator = factory.new_validator(false);
let result = validator.validate(&message)?;
if !result.success() {
    for violation in result.violations() {
        eprintln!("{}: {}", violation.field_path, violation.message);
    }
}
```
*/

pub mod address;
pub mod annotations;
pub mod bridge;
pub mod builtins;
pub mod cel_adapter;
pub mod compiler;
pub mod conformance;
pub mod context;
pub mod error;
pub mod factory;
pub mod node;
pub mod path;
pub mod rules;
pub mod validator;
pub mod value;
pub mod violation;

pub use error::{Error, Result};
pub use factory::Factory;
pub use validator::{ValidationResult, Validator};
pub use violation::Violation;
