//! Canned example patterns per language, shown before the user types a pattern.

use crate::domain::model::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub description: &'static str,
    pub template: &'static str,
}

const fn entry(description: &'static str, template: &'static str) -> CatalogEntry {
    CatalogEntry {
        description,
        template,
    }
}

const GENERIC: &[CatalogEntry] = &[entry("Any call with arguments", "$FUNC($$$ARGS)")];

const PYTHON: &[CatalogEntry] = &[
    entry("Function definitions", "def $FUNC($$$ARGS):"),
    entry("Class definitions", "class $NAME($$$BASES):"),
    entry("Method calls on any object", "$OBJ.$METHOD($$$ARGS)"),
    entry("Print calls", "print($$$ARGS)"),
    entry("Imports from a module", "from $MODULE import $$$NAMES"),
    entry("Comparisons against None with ==", "$X == None"),
];

const JAVASCRIPT: &[CatalogEntry] = &[
    entry("Function declarations", "function $NAME($$$PARAMS) { $$$BODY }"),
    entry("Arrow functions bound to a name", "const $NAME = ($$$PARAMS) => $BODY"),
    entry("Console logging", "console.log($$$ARGS)"),
    entry("Awaited expressions", "await $PROMISE"),
    entry("Event listeners", "$TARGET.addEventListener($EVENT, $$$REST)"),
];

const TYPESCRIPT: &[CatalogEntry] = &[
    entry("Interface declarations", "interface $NAME { $$$MEMBERS }"),
    entry("Typed function declarations", "function $NAME($$$PARAMS): $RET { $$$BODY }"),
    entry("Casts to any", "$EXPR as any"),
    entry("Non-null assertions", "$EXPR!"),
    entry("Console logging", "console.log($$$ARGS)"),
];

const RUST: &[CatalogEntry] = &[
    entry("Unwrap calls", "$EXPR.unwrap()"),
    entry("Expect calls", "$EXPR.expect($MSG)"),
    entry("Trait implementations", "impl $TRAIT for $TYPE { $$$ITEMS }"),
    entry("Print macros", "println!($$$ARGS)"),
    entry("Unsafe blocks", "unsafe { $$$BODY }"),
    entry("Clones", "$EXPR.clone()"),
];

const GO: &[CatalogEntry] = &[
    entry("Function declarations", "func $NAME($$$PARAMS) $$$RET { $$$BODY }"),
    entry("Error checks", "if err != nil { $$$BODY }"),
    entry("Printing with fmt", "fmt.Println($$$ARGS)"),
    entry("Goroutine launches", "go $FUNC($$$ARGS)"),
    entry("Deferred calls", "defer $CALL"),
];

const ZIG: &[CatalogEntry] = &[
    entry("Function declarations", "fn $NAME($$$PARAMS) $RET { $$$BODY }"),
    entry("Try expressions", "try $EXPR"),
    entry("Debug printing", "std.debug.print($$$ARGS)"),
    entry("Imports", "@import($PATH)"),
    entry("Deferred frees", "defer $ALLOC.free($BUF)"),
];

const RUBY: &[CatalogEntry] = &[
    entry("Method definitions", "def $NAME($$$PARAMS) $$$BODY end"),
    entry("Puts calls", "puts $$$ARGS"),
    entry("Each blocks", "$RECV.each do |$ITEM| $$$BODY end"),
    entry("Requires", "require $LIB"),
    entry("Raised errors", "raise $ERROR"),
];

/// Example patterns for `language`, in display order.
pub fn examples(language: Language) -> &'static [CatalogEntry] {
    match language {
        Language::Python => PYTHON,
        Language::JavaScript => JAVASCRIPT,
        Language::TypeScript => TYPESCRIPT,
        Language::Rust => RUST,
        Language::Go => GO,
        Language::Zig => ZIG,
        Language::Ruby => RUBY,
    }
}

/// Lookup by raw identifier; unknown identifiers get a single generic entry.
pub fn examples_for_id(id: &str) -> &'static [CatalogEntry] {
    id.parse::<Language>().map_or(GENERIC, examples)
}
