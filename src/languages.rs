//! Languages offered by the editor's language selector.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    /// Stable identifier used on the command line and in the web API.
    pub id: &'static str,
    pub name: &'static str,
    /// Editor syntax-highlighting tag.
    pub language: &'static str,
    /// Starting draft when the language is picked for a fresh editor.
    pub snippet: &'static str,
}

pub const LANGUAGES: &[LanguageOption] = &[
    LanguageOption {
        id: "javascript",
        name: "JavaScript",
        language: "javascript",
        snippet: "function greet(name) {\n\tconsole.log(\"Hello, \" + name + \"!\");\n}\n\ngreet(\"Alex\");\n",
    },
    LanguageOption {
        id: "typescript",
        name: "TypeScript",
        language: "typescript",
        snippet: "type Params = {\n\tname: string;\n}\n\nfunction greet(data: Params) {\n\tconsole.log(\"Hello, \" + data.name + \"!\");\n}\n\ngreet({ name: \"Alex\" });\n",
    },
    LanguageOption {
        id: "python",
        name: "Python",
        language: "python",
        snippet: "def greet(name):\n\tprint(\"Hello, \" + name + \"!\")\n\ngreet(\"Alex\")\n",
    },
    LanguageOption {
        id: "java",
        name: "Java",
        language: "java",
        snippet: "public class HelloWorld {\n\tpublic static void main(String[] args) {\n\t\tSystem.out.println(\"Hello World\");\n\t}\n}\n",
    },
    LanguageOption {
        id: "cpp",
        name: "C++",
        language: "cpp",
        snippet: "#include <iostream>\n\nint main() {\n\tstd::cout << \"Hello World\" << std::endl;\n\treturn 0;\n}\n",
    },
    LanguageOption {
        id: "c",
        name: "C",
        language: "c",
        snippet: "#include <stdio.h>\n\nint main(void) {\n\tprintf(\"Hello World\\n\");\n\treturn 0;\n}\n",
    },
    LanguageOption {
        id: "csharp",
        name: "C#",
        language: "csharp",
        snippet: "using System;\n\nnamespace HelloWorld\n{\n\tclass Hello {\n\t\tstatic void Main(string[] args) {\n\t\t\tConsole.WriteLine(\"Hello World in C#\");\n\t\t}\n\t}\n}\n",
    },
    LanguageOption {
        id: "go",
        name: "Go",
        language: "go",
        snippet: "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello World\")\n}\n",
    },
    LanguageOption {
        id: "rust",
        name: "Rust",
        language: "rust",
        snippet: "fn main() {\n    println!(\"Hello World\");\n}\n",
    },
    LanguageOption {
        id: "php",
        name: "PHP",
        language: "php",
        snippet: "<?php\n\n$name = 'Alex';\necho $name;\n",
    },
];

/// The selector's initial choice.
pub fn default_language() -> &'static LanguageOption {
    &LANGUAGES[0]
}

/// Case-insensitive lookup by id.
pub fn find_language(id: &str) -> Option<&'static LanguageOption> {
    LANGUAGES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_default_is_javascript() {
        assert_eq!(default_language().id, "javascript");
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = LANGUAGES.iter().map(|l| l.id).collect();
        assert_eq!(ids.len(), LANGUAGES.len());
    }

    #[test]
    fn test_every_language_has_snippet() {
        assert!(LANGUAGES.iter().all(|l| !l.snippet.trim().is_empty()));
    }

    #[rstest]
    #[case("python", "Python")]
    #[case("PYTHON", "Python")]
    #[case("cpp", "C++")]
    #[case("Rust", "Rust")]
    fn test_find_language(#[case] id: &str, #[case] name: &str) {
        assert_eq!(find_language(id).map(|l| l.name), Some(name));
    }

    #[test]
    fn test_find_unknown_language() {
        assert!(find_language("cobol").is_none());
    }
}
