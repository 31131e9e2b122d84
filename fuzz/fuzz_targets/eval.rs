#![no_main]

use libfuzzer_sys::fuzz_target;
use xgettext_go::eval::eval_string;
use xgettext_go_fuzz::Expr;

fuzz_target!(|expr: Expr| {
    let _ = eval_string(&expr.into());
});
