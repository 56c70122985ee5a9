//! Diagnostic textual rendering of a module.
//!
//! The format is for humans reading test failures and logs; it is not a
//! compatibility surface and may change freely.

use std::fmt::Write;

use crate::instr::{Block, Instr};
use crate::module::{FuncDef, GlobalInit, Module};
use crate::types::Type;

impl Module {
    /// Render the whole module as indented text.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "module");

        let _ = writeln!(out, "  types:");
        for (id, ty) in self.types().iter() {
            let _ = writeln!(out, "    {id} = {}", render_type(ty));
        }

        for global in self.globals() {
            let init = match global.init() {
                GlobalInit::Int(v) => format!("int {v}"),
                GlobalInit::Float(v) => format!("float {v}"),
            };
            let _ = writeln!(out, "  global {}: {} = {}", global.name(), global.ty(), init);
        }

        for (_, item) in self.static_data().iter() {
            let kind = if item.is_mutable() { "mutable" } else { "immutable" };
            let _ = writeln!(out, "  data: {} byte(s), {}", item.bytes().len(), kind);
        }

        for def in self.functions() {
            match def {
                FuncDef::Extern(f) => {
                    let _ = writeln!(out, "  extern {}: {}", f.name(), f.ty());
                }
                FuncDef::Local(f) => {
                    let _ = writeln!(out, "  func {}: {}", f.name(), f.ty());
                    for (i, local) in f.locals().iter().enumerate() {
                        let origin = if local.is_arg() { "arg" } else { "temp" };
                        let _ = writeln!(out, "    l{i}: {} ({origin})", local.ty);
                    }
                    for block in f.blocks() {
                        render_block(&mut out, block);
                    }
                }
            }
        }
        out
    }
}

fn render_type(ty: &Type) -> String {
    match ty {
        Type::Int8 => "int8".into(),
        Type::UInt8 => "uint8".into(),
        Type::Int16 => "int16".into(),
        Type::UInt16 => "uint16".into(),
        Type::Int32 => "int32".into(),
        Type::UInt32 => "uint32".into(),
        Type::Float32 => "float32".into(),
        Type::Ptr => "ptr".into(),
        Type::Func { params, results } => {
            let params: Vec<String> = params.iter().map(|t| t.to_string()).collect();
            let results: Vec<String> = results.iter().map(|t| t.to_string()).collect();
            format!("func({}) -> ({})", params.join(", "), results.join(", "))
        }
        Type::Struct { fields } => {
            let fields: Vec<String> = fields.iter().map(|t| t.to_string()).collect();
            format!("struct {{{}}}", fields.join(", "))
        }
    }
}

fn render_block(out: &mut String, block: &Block) {
    let results: Vec<String> = block.results().iter().map(|t| t.to_string()).collect();
    let _ = writeln!(
        out,
        "    {} {} -> ({})",
        block.id(),
        block.tag().name(),
        results.join(", ")
    );
    for instr in block.instrs() {
        let _ = writeln!(out, "      {}", render_instr(instr));
    }
}

fn render_instr(instr: &Instr) -> String {
    match instr {
        Instr::LdInt(v, ty) => format!("ld_int {v} {ty}"),
        Instr::LdFloat(v) => format!("ld_float {v}"),
        Instr::IAdd => "iadd".into(),
        Instr::ISub => "isub".into(),
        Instr::IMul => "imul".into(),
        Instr::IDiv => "idiv".into(),
        Instr::FAdd => "fadd".into(),
        Instr::FSub => "fsub".into(),
        Instr::FMul => "fmul".into(),
        Instr::FDiv => "fdiv".into(),
        Instr::Not => "not".into(),
        Instr::BitAnd => "bitand".into(),
        Instr::BitOr => "bitor".into(),
        Instr::Itof => "itof".into(),
        Instr::Ftoi { int_ty } => format!("ftoi {int_ty}"),
        Instr::IConv { target } => format!("iconv {target}"),
        Instr::Bitcast { target } => format!("bitcast {target}"),
        Instr::ICmp(cmp) => format!("icmp {}", cmp.name()),
        Instr::FCmp(cmp) => format!("fcmp {}", cmp.name()),
        Instr::LdLocal(l) => format!("ld_local {l}"),
        Instr::StLocal(l) => format!("st_local {l}"),
        Instr::LdGlobal(name) => format!("ld_global {name}"),
        Instr::StGlobal(name) => format!("st_global {name}"),
        Instr::Read { ty } => format!("read {ty}"),
        Instr::Write { ty } => format!("write {ty}"),
        Instr::Offset { ty } => format!("offset {ty}"),
        Instr::GetFieldPtr {
            struct_ty,
            field_idx,
        } => format!("get_field_ptr {struct_ty} {field_idx}"),
        Instr::LdStaticMemPtr(d) => format!("ld_static_mem_ptr {d}"),
        Instr::MemorySize => "memory_size".into(),
        Instr::MemoryGrow => "memory_grow".into(),
        Instr::Call { name } => format!("call {name}"),
        Instr::CallIndirect => "call_indirect".into(),
        Instr::LdGlobalFunc { name } => format!("ld_global_func {name}"),
        Instr::If { then_block } => format!("if {then_block}"),
        Instr::IfElse {
            then_block,
            else_block,
        } => format!("if_else {then_block} {else_block}"),
        Instr::Loop(b) => format!("loop {b}"),
        Instr::Break => "break".into(),
        Instr::Return => "return".into(),
        Instr::Fail => "fail".into(),
        Instr::Discard => "discard".into(),
    }
}
