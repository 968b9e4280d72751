//! Built-in "behaviors": pluggable `TaskBehavior` implementations that
//! give the core engine something real to run (spec.md Section 1: the
//! behaviors library itself — git clone, Node build, HTML/CSS URL
//! rewriting — is out of core scope, but is "treated as pluggable Task
//! implementations conforming to the core task contract", which is exactly
//! what this crate demonstrates with two representative behaviors).

pub mod copy_behavior;
pub mod error;
pub mod html_rewrite;

pub use copy_behavior::CopyBehavior;
pub use error::{BehaviorError, Result};
pub use html_rewrite::HtmlRewriteBehavior;
