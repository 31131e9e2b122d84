// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reduce message arguments to their string value.

use crate::error::EvalError;
use crate::syntax::Expr;

/// Evaluate `expr` to the text stored in the catalog.
///
/// Literals are trimmed but never unescaped, so `"a\tb"` yields the
/// four characters `a\tb`. Concatenations are joined with
/// [`join_fragments`]. Binary expressions with other operators
/// evaluate to the empty string.
///
/// # Examples
///
/// ```
/// use xgettext_go::eval::eval_string;
/// use xgettext_go::syntax::Expr;
///
/// let expr = Expr::Literal(String::from(r#""Hello, %s!""#));
/// assert_eq!(eval_string(&expr).unwrap(), "Hello, %s!");
/// ```
pub fn eval_string(expr: &Expr) -> Result<String, EvalError> {
    match expr {
        Expr::Literal(raw) => Ok(trim_literal(raw).to_owned()),
        Expr::Binary { op, left, right } => {
            if op != "+" {
                return Ok(String::new());
            }
            let left = eval_string(left)?;
            let right = eval_string(right)?;
            join_fragments(&left, &right)
        }
        Expr::Other { kind, text } => Err(EvalError::NotConstant {
            kind: kind.clone(),
            text: text.clone(),
        }),
    }
}

/// Strip whitespace, then every leading and trailing `"` or newline.
fn trim_literal(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\n')
}

/// Join two evaluated fragments by dropping the last character of
/// `left` and the first character of `right`.
///
/// Both fragments have already been trimmed, so this removes real
/// text: `"ab" + "cd"` becomes `ad`. Existing catalogs depend on this.
// TODO: drop the quotes at the token level instead, so that
// concatenations keep every character.
pub fn join_fragments(left: &str, right: &str) -> Result<String, EvalError> {
    let mut left_chars = left.chars();
    let mut right_chars = right.chars();
    if left_chars.next_back().is_none() || right_chars.next().is_none() {
        return Err(EvalError::EmptyOperand);
    }
    Ok(format!("{}{}", left_chars.as_str(), right_chars.as_str()))
}
