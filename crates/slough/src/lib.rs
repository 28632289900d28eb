#![doc = include_str!("../../../README.md")]

pub mod ast;
mod decompile;
mod fold;
mod inline;
mod lexer;
mod parse;
pub mod rewrite;
pub mod sourcemap;
mod value;
pub mod visit;

pub use crate::{
    decompile::{EmitError, Target, decompile, decompile_expr},
    fold::{fold_expr, fold_module},
    inline::{INLINE_DEPTH_LIMIT, inline_module},
    parse::{ParseError, parse},
    rewrite::{Rewrite, RewriteError},
    sourcemap::Report,
    visit::Visit,
};
