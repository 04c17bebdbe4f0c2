//! Function definitions

use std::rc::Rc;

use super::{Exec, Flow, Signal};
use crate::ast::FunctionDef;
use crate::value::{UserFunction, Value};

/// Create a function value closing over the current scope and assign it to
/// its name. Redefinition overwrites.
pub(crate) fn exec_def(def: &Rc<FunctionDef>, exec: &mut Exec<'_>) -> Result<Flow, Signal> {
    let env = exec.rt.current_env();
    let function = UserFunction::new(Rc::clone(def), env.clone());
    env.set(&def.name, Value::Function(Rc::new(function)));
    Ok(Flow::Normal)
}
