//! `if` / `elif` / `else`

use super::resume::Resume;
use super::{Evaluate, Exec, Flow, Signal};
use crate::ast::IfStmt;

/// Test the arms in order and run the body of the first truthy one, or the
/// `else` body when none is. Bodies run in the enclosing scope.
pub(crate) fn exec_if(stmt: &IfStmt, exec: &mut Exec<'_>) -> Result<Flow, Signal> {
    let (mut arm, resumed_in_body) = exec.resume.take_if()?.unwrap_or((0, false));

    if !resumed_in_body {
        while let Some((cond, _)) = stmt.arm(arm) {
            let test = cond.eval(exec);
            let test = exec.suspend(test, || Resume::If {
                arm,
                in_body: false,
            })?;
            if test.is_truthy() {
                break;
            }
            arm += 1;
        }
    }

    // arm_count() selects the else body
    let body = match stmt.arm(arm) {
        Some((_, body)) => body,
        None => stmt.orelse.as_slice(),
    };
    let flow = exec.exec_block(body);
    exec.suspend(flow, || Resume::If { arm, in_body: true })
}
