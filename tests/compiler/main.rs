mod codegen;
mod end_to_end;
mod helpers;
mod literate;
mod resolver;
