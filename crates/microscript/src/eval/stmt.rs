//! Statement dispatch, `print` and expression statements

use super::{assign, function, if_stmt, loops, return_stmt};
use super::{Evaluate, Exec, Execute, Flow, Signal};
use crate::ast::{Expr, Stmt};

impl Execute for Stmt {
    fn exec(&self, exec: &mut Exec<'_>) -> Result<Flow, Signal> {
        match self {
            Stmt::Assign { target, value, pos } => assign::exec_assign(target, value, *pos, exec),
            Stmt::Print { value, .. } => exec_print(value, exec),
            Stmt::If(stmt) => if_stmt::exec_if(stmt, exec),
            Stmt::While { cond, body, pos } => loops::exec_while(cond, body, *pos, exec),
            Stmt::For {
                var,
                iterable,
                body,
                pos,
            } => loops::exec_for(var, iterable, body, *pos, exec),
            Stmt::FunctionDef(def) => function::exec_def(def, exec),
            Stmt::Return { value, .. } => return_stmt::exec_return(value.as_ref(), exec),
            Stmt::Expr(expr) => {
                expr.eval(exec)?;
                Ok(Flow::Normal)
            }
        }
    }
}

/// Write the value's text and a newline to the output sink.
fn exec_print(value: &Expr, exec: &mut Exec<'_>) -> Result<Flow, Signal> {
    let value = value.eval(exec)?;
    exec.out.write_str(&format!("{value}\n"));
    Ok(Flow::Normal)
}
