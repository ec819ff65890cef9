//! Text renderings of a dictionary.

use std::fmt::Write;

use vxconfig_vm::number::format_double;

use super::{Dictionary, DictionaryEntry, EntryValue};

const TAB: &str = "   ";

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(TAB);
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Inline rendering of a non-container value.
fn scalar_text(value: &EntryValue) -> Option<String> {
    Some(match value {
        EntryValue::Int(i) => i.to_string(),
        EntryValue::Double(d) => format_double(*d),
        EntryValue::Bool(b) => b.to_string(),
        EntryValue::String(s) => quote(s),
        EntryValue::Threshold(t) => t.get_str(),
        EntryValue::PiecewiseLinear(p) => p.to_string(),
        EntryValue::Dict(_) | EntryValue::Array(_) | EntryValue::UserFunction(_) => return None,
    })
}

fn type_name(value: &EntryValue) -> &'static str {
    match value {
        EntryValue::Int(_) => "IntegerType",
        EntryValue::Double(_) => "FloatType",
        EntryValue::Bool(_) => "BooleanType",
        EntryValue::String(_) => "StringType",
        EntryValue::Threshold(_) => "ThresholdType",
        EntryValue::PiecewiseLinear(_) => "PiecewiseLinearType",
        EntryValue::Dict(_) => "DictionaryType",
        EntryValue::Array(_) => "ArrayType",
        EntryValue::UserFunction(_) => "UserFunctionType",
    }
}

impl Dictionary {
    /// Render as configuration text that parses back to the same entries.
    pub fn dump_config_format(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            config_entry(&mut out, entry, 0);
        }
        out
    }

    /// Render the entry tree with types, for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        debug_dict(&mut out, self, 0);
        out
    }
}

fn config_entry(out: &mut String, entry: &DictionaryEntry, depth: usize) {
    indent(out, depth);
    match &entry.value {
        EntryValue::Dict(d) => {
            let _ = writeln!(out, "{} = {{", entry.name);
            for child in d.iter() {
                config_entry(out, child, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        EntryValue::Array(arr) => {
            let _ = write!(out, "{} = ", entry.name);
            config_array(out, arr, depth);
            out.push_str(";\n");
        }
        EntryValue::UserFunction(f) => {
            let _ = writeln!(out, "/* {}: user function ({} args) */", entry.name, f.n_args);
        }
        value => {
            let text = scalar_text(value).unwrap_or_default();
            let _ = writeln!(out, "{} = {text};", entry.name);
        }
    }
}

fn config_array(out: &mut String, arr: &Dictionary, depth: usize) {
    if arr.is_empty() {
        out.push_str("[]");
        return;
    }

    let inline: Option<Vec<String>> = arr.iter().map(|e| scalar_text(&e.value)).collect();
    if let Some(items) = inline {
        let _ = write!(out, "[ {} ]", items.join(", "));
        return;
    }

    out.push_str("[\n");
    for (i, element) in arr.iter().enumerate() {
        indent(out, depth + 1);
        match &element.value {
            EntryValue::Dict(d) => {
                out.push_str("{\n");
                for child in d.iter() {
                    config_entry(out, child, depth + 2);
                }
                indent(out, depth + 1);
                out.push('}');
            }
            EntryValue::Array(inner) => config_array(out, inner, depth + 1),
            value => out.push_str(&scalar_text(value).unwrap_or_default()),
        }
        out.push_str(if i + 1 < arr.len() { ",\n" } else { "\n" });
    }
    indent(out, depth);
    out.push(']');
}

fn debug_dict(out: &mut String, dict: &Dictionary, depth: usize) {
    indent(out, depth);
    let _ = writeln!(out, "Nentries = {}", dict.len());
    indent(out, depth);
    let _ = writeln!(out, "IsArray  = {}", dict.is_array());
    for (j, entry) in dict.iter().enumerate() {
        indent(out, depth);
        let _ = writeln!(out, "Dictionary Entry[{j}] ...");
        debug_entry(out, entry, depth + 1);
    }
}

fn debug_entry(out: &mut String, entry: &DictionaryEntry, depth: usize) {
    indent(out, depth);
    let _ = writeln!(out, "Name  = {}", entry.name);
    indent(out, depth);
    let _ = writeln!(out, "Type  = {}", type_name(&entry.value));
    indent(out, depth);
    match &entry.value {
        EntryValue::Int(i) => {
            let _ = writeln!(out, "Integer Value = {i}");
        }
        EntryValue::Double(d) => {
            let _ = writeln!(out, "Float Value = {}", format_double(*d));
        }
        EntryValue::Bool(b) => {
            let _ = writeln!(out, "Boolean Value = {b}");
        }
        EntryValue::String(s) if s.is_empty() => out.push_str("String Value = (nul)\n"),
        EntryValue::String(s) => {
            let _ = writeln!(out, "String Value = \"{s}\"");
        }
        EntryValue::Dict(d) | EntryValue::Array(d) => {
            out.push_str("Dict/Array Value = \n");
            debug_dict(out, d, depth + 1);
        }
        EntryValue::Threshold(t) => {
            out.push_str("Thresh Value = \n");
            let fields = [
                ("type  ", t.get_type().to_string()),
                ("value ", optional(t.get_value().map(format_double))),
                ("ptype ", optional(t.get_ptype().map(|p| p.to_string()))),
                ("pvalue", optional(t.get_pvalue().map(format_double))),
                ("string", t.get_str()),
            ];
            for (label, value) in fields {
                indent(out, depth + 1);
                let _ = writeln!(out, "{label} = {value}");
            }
        }
        EntryValue::PiecewiseLinear(p) => {
            let _ = writeln!(out, "Function Value = {p}");
        }
        EntryValue::UserFunction(f) => {
            let _ = writeln!(out, "Function Value = {} args: {}", f.n_args, f.body);
        }
    }
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "NA".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_format_scalars_and_arrays() {
        let mut arr = Dictionary::new_array();
        arr.store(DictionaryEntry::unnamed(EntryValue::Int(1)));
        arr.store(DictionaryEntry::unnamed(EntryValue::Double(2.0)));
        let mut inner = Dictionary::new();
        inner.store(DictionaryEntry::new("s", EntryValue::String("a \"b\"".into())));

        let mut d = Dictionary::new();
        d.store(DictionaryEntry::new("n", EntryValue::Int(3)));
        d.store(DictionaryEntry::new("arr", EntryValue::Array(arr)));
        d.store(DictionaryEntry::new("empty", EntryValue::Array(Dictionary::new_array())));
        d.store(DictionaryEntry::new("inner", EntryValue::Dict(inner)));

        assert_eq!(
            d.dump_config_format(),
            "n = 3;\narr = [ 1, 2.0 ];\nempty = [];\ninner = {\n   s = \"a \\\"b\\\"\";\n}\n"
        );
    }

    #[test]
    fn test_config_format_dict_array() {
        let mut element = Dictionary::new();
        element.store(DictionaryEntry::new("x", EntryValue::Int(1)));
        let mut arr = Dictionary::new_array();
        arr.store(DictionaryEntry::unnamed(EntryValue::Dict(element.clone())));
        arr.store(DictionaryEntry::unnamed(EntryValue::Dict(element)));
        let mut d = Dictionary::new();
        d.store(DictionaryEntry::new("list", EntryValue::Array(arr)));

        assert_eq!(
            d.dump_config_format(),
            "list = [\n   {\n      x = 1;\n   },\n   {\n      x = 1;\n   }\n];\n"
        );
    }

    #[test]
    fn test_debug_dump() {
        let mut d = Dictionary::new();
        d.store(DictionaryEntry::new("x", EntryValue::Int(14)));
        d.store(DictionaryEntry::new("s", EntryValue::String(String::new())));
        let dump = d.dump();
        assert_eq!(
            dump,
            "Nentries = 2\nIsArray  = false\nDictionary Entry[0] ...\n   Name  = x\n   Type  = IntegerType\n   Integer Value = 14\nDictionary Entry[1] ...\n   Name  = s\n   Type  = StringType\n   String Value = (nul)\n"
        );
    }
}
