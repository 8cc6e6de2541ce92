//! Built-in taxonomies and their keyword sets.
//!
//! Two taxonomies ship with the engine: programming languages and AI
//! sub-fields. Keywords are lowercase substrings; classification is
//! non-exclusive, so the sets are defined independently and may overlap.
//!
//! Single-letter keywords are avoided on purpose. Under substring matching
//! "r" or "go" would hit most English text.

use std::collections::HashMap;
use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Registry name of the programming-language taxonomy.
pub const LANGUAGES: &str = "languages";

/// Registry name of the AI sub-field taxonomy.
pub const AI_FIELDS: &str = "ai-fields";

/// One keyword-defined classification bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    /// Stable identifier (e.g. `python`, `llm`).
    pub key: String,
    /// Human-readable label.
    #[serde(default)]
    pub display_name: String,
    /// Icon hint for the presentation layer.
    #[serde(default)]
    pub icon: String,
    /// Hex color for the presentation layer.
    #[serde(default)]
    pub color: String,
    /// Lowercase substrings that select this category.
    pub keywords: Vec<String>,
}

impl Category {
    fn builtin(key: &str, display_name: &str, icon: &str, color: &str, keywords: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Display name, falling back to the key when unset.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.key
        } else {
            &self.display_name
        }
    }
}

/// A named, ordered set of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Taxonomy {
    /// Registry name.
    pub name: String,
    /// Categories in presentation order.
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, lower-casing every keyword.
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Self {
        let categories = categories
            .into_iter()
            .map(|mut c| {
                c.keywords = c
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                c
            })
            .collect();
        Self {
            name: name.into(),
            categories,
        }
    }

    /// Category keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }
}

/// Programming languages.
pub static LANGUAGE_TAXONOMY: LazyLock<Taxonomy> = LazyLock::new(|| {
    Taxonomy::new(
        LANGUAGES,
        vec![
            Category::builtin(
                "python",
                "Python",
                "🐍",
                "#3776ab",
                &[
                    "python", "pytorch", "django", "flask", "fastapi", "pandas", "numpy",
                    "jupyter", "pip install", "pypi",
                ],
            ),
            Category::builtin(
                "javascript",
                "JavaScript",
                "🟨",
                "#f7df1e",
                &["javascript", "node.js", "nodejs", "react", "vue", "npm"],
            ),
            Category::builtin(
                "typescript",
                "TypeScript",
                "🔷",
                "#3178c6",
                &["typescript", "tsx", "angular", "nestjs"],
            ),
            Category::builtin(
                "rust",
                "Rust",
                "🦀",
                "#dea584",
                &["rust", "cargo", "tokio", "crates.io", "wasm"],
            ),
            Category::builtin(
                "go",
                "Go",
                "🐹",
                "#00add8",
                &["golang", "go语言", "goroutine", "gin框架"],
            ),
            Category::builtin(
                "java",
                "Java",
                "☕",
                "#b07219",
                &["java ", "jdk", "spring boot", "jvm", "maven", "gradle"],
            ),
            Category::builtin(
                "cpp",
                "C++",
                "⚙️",
                "#f34b7d",
                &["c++", "cpp", "cuda", "cmake"],
            ),
            Category::builtin(
                "csharp",
                "C#",
                "🎯",
                "#178600",
                &["c#", "csharp", ".net", "dotnet", "blazor"],
            ),
            Category::builtin(
                "swift",
                "Swift",
                "🍎",
                "#f05138",
                &["swift", "swiftui", "xcode"],
            ),
            Category::builtin(
                "kotlin",
                "Kotlin",
                "🤖",
                "#a97bff",
                &["kotlin", "jetpack compose"],
            ),
            Category::builtin(
                "php",
                "PHP",
                "🐘",
                "#4f5d95",
                &["php", "laravel", "symfony", "wordpress"],
            ),
            Category::builtin(
                "ruby",
                "Ruby",
                "💎",
                "#701516",
                &["ruby", "ruby on rails", "rubygems"],
            ),
        ],
    )
});

/// AI sub-fields.
pub static AI_FIELD_TAXONOMY: LazyLock<Taxonomy> = LazyLock::new(|| {
    Taxonomy::new(
        AI_FIELDS,
        vec![
            Category::builtin(
                "llm",
                "Large Language Models",
                "💬",
                "#722ed1",
                &[
                    "llm", "language model", "gpt", "chatgpt", "claude", "llama", "mistral",
                    "qwen", "deepseek", "retrieval-augmented", "大模型", "大语言模型",
                ],
            ),
            Category::builtin(
                "computer-vision",
                "Computer Vision",
                "👁️",
                "#1890ff",
                &[
                    "computer vision", "image", "vision", "object detection", "segmentation",
                    "yolo", "视觉", "图像",
                ],
            ),
            Category::builtin(
                "nlp",
                "Natural Language Processing",
                "📝",
                "#13c2c2",
                &[
                    "nlp", "natural language", "text classification", "translation", "tokenizer",
                    "自然语言",
                ],
            ),
            Category::builtin(
                "machine-learning",
                "Machine Learning",
                "🧠",
                "#52c41a",
                &[
                    "machine learning", "deep learning", "neural network", "pytorch", "tensorflow",
                    "scikit", "jax", "机器学习", "深度学习",
                ],
            ),
            Category::builtin(
                "generative",
                "Generative AI",
                "🎨",
                "#eb2f96",
                &[
                    "diffusion", "generative", "text-to-image", "text-to-video", "stable diffusion",
                    "midjourney", "aigc", "生成式",
                ],
            ),
            Category::builtin(
                "multimodal",
                "Multimodal",
                "🧩",
                "#fa8c16",
                &["multimodal", "multi-modal", "vlm", "vision-language", "多模态"],
            ),
            Category::builtin(
                "agents",
                "AI Agents",
                "🕹️",
                "#2f54eb",
                &["agent", "autonomous", "tool use", "function calling", "mcp", "智能体"],
            ),
            Category::builtin(
                "reinforcement-learning",
                "Reinforcement Learning",
                "🎮",
                "#faad14",
                &["reinforcement learning", "rlhf", "reward model", "policy gradient", "强化学习"],
            ),
            Category::builtin(
                "speech",
                "Speech & Audio",
                "🎙️",
                "#a0d911",
                &["speech", "audio", "asr", "tts", "whisper", "语音"],
            ),
            Category::builtin(
                "robotics",
                "Robotics",
                "🦾",
                "#8c8c8c",
                &["robot", "embodied", "manipulation", "具身"],
            ),
        ],
    )
});

/// The taxonomies available to an analysis pass.
///
/// Starts from the built-ins; custom taxonomies extend the set and replace a
/// built-in of the same name.
#[derive(Debug, Clone)]
pub struct TaxonomyRegistry {
    taxonomies: Vec<Taxonomy>,
}

impl Default for TaxonomyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaxonomyRegistry {
    /// Registry holding only the built-in taxonomies.
    pub fn builtin() -> Self {
        Self {
            taxonomies: vec![LANGUAGE_TAXONOMY.clone(), AI_FIELD_TAXONOMY.clone()],
        }
    }

    /// Add custom taxonomies (e.g. from configuration).
    ///
    /// Names are processed in sorted order so the result does not depend on
    /// map iteration order.
    pub fn with_custom(mut self, custom: Option<&HashMap<String, Vec<Category>>>) -> Self {
        let Some(custom) = custom else {
            return self;
        };
        let mut names: Vec<&String> = custom.keys().collect();
        names.sort();
        for name in names {
            let taxonomy = Taxonomy::new(name.clone(), custom[name].clone());
            if let Some(existing) = self.taxonomies.iter_mut().find(|t| t.name == *name) {
                tracing::debug!(taxonomy = %name, "custom taxonomy replaces built-in");
                *existing = taxonomy;
            } else {
                self.taxonomies.push(taxonomy);
            }
        }
        self
    }

    /// All taxonomies in evaluation order.
    pub fn all(&self) -> &[Taxonomy] {
        &self.taxonomies
    }

    /// Registered taxonomy names.
    pub fn names(&self) -> Vec<&str> {
        self.taxonomies.iter().map(|t| t.name.as_str()).collect()
    }

    /// Look up a taxonomy by name.
    pub fn get(&self, name: &str) -> AnalysisResult<&Taxonomy> {
        self.taxonomies
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| AnalysisError::UnknownTaxonomy {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Resolve an optional selection: `None` means every taxonomy.
    pub fn select(&self, name: Option<&str>) -> AnalysisResult<Vec<&Taxonomy>> {
        match name {
            None => Ok(self.taxonomies.iter().collect()),
            Some(name) => Ok(vec![self.get(name)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keywords_are_lowercase_and_non_empty() {
        for taxonomy in [&*LANGUAGE_TAXONOMY, &*AI_FIELD_TAXONOMY] {
            for category in &taxonomy.categories {
                assert!(!category.keywords.is_empty(), "{} has no keywords", category.key);
                for kw in &category.keywords {
                    assert_eq!(kw, &kw.to_lowercase());
                    assert!(kw.chars().count() > 1, "single-letter keyword in {}", category.key);
                }
            }
        }
    }

    #[test]
    fn category_keys_are_unique_within_taxonomy() {
        for taxonomy in [&*LANGUAGE_TAXONOMY, &*AI_FIELD_TAXONOMY] {
            let keys: HashSet<&str> = taxonomy.keys().collect();
            assert_eq!(keys.len(), taxonomy.categories.len());
        }
    }

    #[test]
    fn new_lowercases_keywords() {
        let t = Taxonomy::new(
            "frameworks",
            vec![Category {
                key: "web".to_string(),
                display_name: String::new(),
                icon: String::new(),
                color: String::new(),
                keywords: vec!["Axum".to_string(), String::new()],
            }],
        );
        assert_eq!(t.categories[0].keywords, vec!["axum"]);
        assert_eq!(t.categories[0].label(), "web");
    }

    #[test]
    fn custom_taxonomy_extends_registry() {
        let mut custom = HashMap::new();
        custom.insert(
            "frameworks".to_string(),
            vec![Category {
                key: "axum".to_string(),
                display_name: "Axum".to_string(),
                icon: String::new(),
                color: String::new(),
                keywords: vec!["axum".to_string()],
            }],
        );
        let registry = TaxonomyRegistry::builtin().with_custom(Some(&custom));
        assert_eq!(registry.names(), vec!["languages", "ai-fields", "frameworks"]);
        assert!(registry.get("frameworks").is_ok());
    }

    #[test]
    fn custom_taxonomy_replaces_builtin_of_same_name() {
        let mut custom = HashMap::new();
        custom.insert(
            LANGUAGES.to_string(),
            vec![Category {
                key: "zig".to_string(),
                display_name: "Zig".to_string(),
                icon: String::new(),
                color: String::new(),
                keywords: vec!["zig".to_string()],
            }],
        );
        let registry = TaxonomyRegistry::builtin().with_custom(Some(&custom));
        assert_eq!(registry.all().len(), 2);
        let languages = registry.get(LANGUAGES).unwrap();
        assert_eq!(languages.categories.len(), 1);
        assert_eq!(languages.categories[0].key, "zig");
    }

    #[test]
    fn unknown_taxonomy_lists_available() {
        let registry = TaxonomyRegistry::builtin();
        let err = registry.get("nope").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("languages, ai-fields"));
    }

    #[test]
    fn select_none_returns_all() {
        let registry = TaxonomyRegistry::builtin();
        assert_eq!(registry.select(None).unwrap().len(), 2);
        assert_eq!(registry.select(Some(AI_FIELDS)).unwrap().len(), 1);
    }
}
