//! Task classification.
//!
//! Maps a completion request to a `(TaskType, TaskComplexity)` pair so the
//! smart router can score candidates. Three implementations:
//!
//! - [`RuleClassifier`] — keyword and regex rules, no LLM call, fast.
//! - [`LlmClassifier`] — asks a small model, higher accuracy at a cost.
//! - [`CompositeClassifier`] — rules first, LLM consulted when the rules
//!   fall through to plain chat.

use crate::task::{TaskComplexity, TaskType};
use async_trait::async_trait;
use compact_str::CompactString;
use regex::Regex;
use relay_core::{CompletionRequest, Message, Provider, Role};
use std::sync::Arc;

/// Classifies a request into a task type and complexity.
#[async_trait]
pub trait TaskClassifier: Send + Sync {
    /// Classify the request. Infallible: implementations fall back to
    /// `(chat, medium)` rather than erroring.
    async fn classify(&self, req: &CompletionRequest) -> (TaskType, TaskComplexity);

    /// Stable classifier name.
    fn name(&self) -> &'static str;
}

/// A single classification rule.
pub struct ClassificationRule {
    /// Task type assigned when the rule matches
    pub task_type: TaskType,

    /// Keywords matched as lowercase substrings (any match fires the rule)
    pub keywords: Vec<String>,

    /// Case-insensitive regex patterns (any match fires the rule)
    pub patterns: Vec<Regex>,

    /// Higher priority wins among matching rules
    pub priority: i32,

    /// Substring hints that override the length-based complexity estimate
    pub complexity_hints: Vec<(String, TaskComplexity)>,
}

/// Rule-based classifier. No LLM calls.
pub struct RuleClassifier {
    rules: Vec<ClassificationRule>,
    default_task: TaskType,
    default_complexity: TaskComplexity,
}

impl RuleClassifier {
    /// Create a classifier with the built-in rule set.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            default_task: TaskType::Chat,
            default_complexity: TaskComplexity::Medium,
        }
    }

    /// Add a custom rule.
    pub fn add_rule(&mut self, rule: ClassificationRule) {
        self.rules.push(rule);
    }

    /// Override the default task type used when no rule matches.
    pub fn set_default_task(&mut self, task: TaskType) {
        self.default_task = task;
    }

    /// Override the default complexity.
    pub fn set_default_complexity(&mut self, complexity: TaskComplexity) {
        self.default_complexity = complexity;
    }

    fn classify_text(&self, text: &str) -> (TaskType, TaskComplexity) {
        if text.is_empty() {
            return (self.default_task, self.default_complexity);
        }

        let lower = text.to_lowercase();
        let mut matched: Option<&ClassificationRule> = None;
        for rule in &self.rules {
            if rule_matches(&lower, rule) {
                match matched {
                    Some(best) if best.priority >= rule.priority => {}
                    _ => matched = Some(rule),
                }
            }
        }

        match matched {
            Some(rule) => {
                // A hint overrides outright; otherwise the length estimate
                // applies, floored at the default for matched rules.
                let complexity = hint_complexity(&lower, rule)
                    .unwrap_or_else(|| estimate_complexity(text).max(self.default_complexity));
                (rule.task_type, complexity)
            }
            None => (self.default_task, estimate_complexity(text)),
        }
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskClassifier for RuleClassifier {
    async fn classify(&self, req: &CompletionRequest) -> (TaskType, TaskComplexity) {
        self.classify_text(&extract_text(req))
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

/// Concatenate user and system message contents.
fn extract_text(req: &CompletionRequest) -> String {
    let texts: Vec<&str> = req
        .messages
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::System))
        .map(|m| m.content.as_str())
        .collect();
    texts.join(" ")
}

fn rule_matches(lower: &str, rule: &ClassificationRule) -> bool {
    if rule.keywords.iter().any(|k| lower.contains(k.as_str())) {
        return true;
    }
    rule.patterns.iter().any(|p| p.is_match(lower))
}

fn hint_complexity(lower: &str, rule: &ClassificationRule) -> Option<TaskComplexity> {
    rule.complexity_hints
        .iter()
        .find(|(hint, _)| lower.contains(hint.as_str()))
        .map(|(_, complexity)| *complexity)
}

/// Length- and vocabulary-based complexity estimate, used when no rule hint
/// applies.
fn estimate_complexity(text: &str) -> TaskComplexity {
    let length = text.len();
    let indicators = count_complexity_indicators(text);

    if length > 2000 || indicators > 5 {
        TaskComplexity::Expert
    } else if length > 1000 || indicators > 3 {
        TaskComplexity::Complex
    } else if length > 300 || indicators > 1 {
        TaskComplexity::Medium
    } else {
        TaskComplexity::Simple
    }
}

/// Markers of demanding requests, across the languages the classifier sees
/// in practice.
const COMPLEXITY_INDICATORS: &[&str] = &[
    "详细分析",
    "深入研究",
    "全面评估",
    "系统设计",
    "架构",
    "优化",
    "重构",
    "性能调优",
    "深度学习",
    "机器学习",
    "算法设计",
    "comprehensive",
    "in-depth",
    "thorough",
    "architecture",
    "optimization",
    "refactor",
    "algorithm",
    "distributed",
    "scalable",
    "前沿",
    "创新",
    "突破性",
    "研究级",
    "state-of-the-art",
    "cutting-edge",
    "novel",
];

fn count_complexity_indicators(text: &str) -> usize {
    let lower = text.to_lowercase();
    COMPLEXITY_INDICATORS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count()
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("invalid built-in classification pattern")
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

fn hints(pairs: &[(&str, TaskComplexity)]) -> Vec<(String, TaskComplexity)> {
    pairs
        .iter()
        .map(|(hint, complexity)| (hint.to_lowercase(), *complexity))
        .collect()
}

fn default_rules() -> Vec<ClassificationRule> {
    use TaskComplexity::{Complex, Expert, Medium, Simple};

    vec![
        ClassificationRule {
            task_type: TaskType::Coding,
            keywords: keywords(&[
                "代码", "编程", "函数", "方法", "实现", "bug", "调试", "修复", "重构",
                "优化代码", "代码审查", "code", "program", "function", "method", "class",
                "implement", "debug", "fix", "refactor", "coding", "programming", "developer",
            ]),
            patterns: vec![
                pattern(r"(?i)write\s+(a\s+)?(code|function|program|script)"),
                pattern(r"(?i)(fix|debug|solve)\s+(this\s+)?(bug|error|issue)"),
                pattern(r"(?i)(python|javascript|go|java|rust|typescript|c\+\+)"),
                pattern("```[a-z]*\\n"),
            ],
            priority: 10,
            complexity_hints: hints(&[
                ("简单", Simple),
                ("simple", Simple),
                ("架构", Expert),
                ("architecture", Expert),
                ("分布式", Expert),
                ("distributed", Expert),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Reasoning,
            keywords: keywords(&[
                "推理", "分析原因", "为什么", "怎么解释", "逻辑", "论证", "推断", "假设",
                "reason", "why", "explain", "logic", "argument", "deduce", "infer",
                "hypothesis", "think through", "step by step",
            ]),
            patterns: vec![
                pattern(r"(?i)let'?s\s+think\s+(about\s+)?(this\s+)?step\s+by\s+step"),
                pattern(r"(?i)what\s+(is|are)\s+the\s+reason"),
                pattern(r"(?i)(analyze|explain)\s+(why|how)"),
            ],
            priority: 8,
            complexity_hints: hints(&[
                ("复杂", Complex),
                ("complex", Complex),
                ("深入", Expert),
                ("in-depth", Expert),
                ("简单解释", Simple),
                ("basically", Simple),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Math,
            keywords: keywords(&[
                "计算", "数学", "公式", "方程", "求解", "证明", "微积分", "线性代数",
                "calculate", "math", "formula", "equation", "solve", "prove", "calculus",
                "algebra", "derivative", "integral", "matrix",
            ]),
            patterns: vec![
                pattern(r"(?i)(solve|calculate|compute)\s+(the\s+)?(equation|expression|formula)"),
                pattern(r"\d+\s*[\+\-\*/\^]\s*\d+"),
                pattern(r"(?i)(prove|derive|find)\s+(that|the)"),
            ],
            priority: 9,
            complexity_hints: hints(&[
                ("简单计算", Simple),
                ("basic", Simple),
                ("高等数学", Complex),
                ("advanced", Complex),
                ("证明", Expert),
                ("prove", Expert),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Analysis,
            keywords: keywords(&[
                "分析", "数据", "统计", "趋势", "洞察", "报告", "指标", "评估", "analyze",
                "analysis", "data", "statistics", "trend", "insight", "report", "metric",
                "evaluate", "assessment",
            ]),
            patterns: vec![
                pattern(r"(?i)analyze\s+(the\s+)?(data|results|performance)"),
                pattern(r"(?i)(what|how)\s+(does|do)\s+(the\s+)?data\s+(show|indicate)"),
            ],
            priority: 7,
            complexity_hints: hints(&[
                ("简单分析", Simple),
                ("overview", Simple),
                ("深度分析", Complex),
                ("deep", Complex),
                ("全面评估", Expert),
                ("comprehensive", Expert),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Summarization,
            keywords: keywords(&[
                "摘要", "总结", "概括", "提炼", "要点", "简述", "归纳", "summary",
                "summarize", "summarise", "brief", "overview", "key points", "tldr", "tl;dr",
            ]),
            patterns: vec![
                pattern(r"(?i)(summarize|summarise|give\s+(me\s+)?a\s+summary)"),
                pattern(r"(?i)what\s+(are\s+)?the\s+(main|key)\s+points"),
                pattern(r"(?i)in\s+(brief|short|summary)"),
            ],
            priority: 6,
            complexity_hints: hints(&[
                ("简短", Simple),
                ("brief", Simple),
                ("详细摘要", Medium),
                ("detailed", Medium),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Extraction,
            keywords: keywords(&[
                "提取", "抽取", "识别", "解析", "获取", "提炼信息", "实体识别", "extract",
                "parse", "identify", "recognize", "retrieve", "entity", "ner", "extraction",
            ]),
            patterns: vec![
                pattern(r"(?i)extract\s+(the\s+)?(information|data|entities)"),
                pattern(r"(?i)(identify|recognize|find)\s+(all\s+)?(the\s+)?(names|dates|entities)"),
                pattern(r"(?i)parse\s+(the\s+)?(text|document|json)"),
            ],
            priority: 7,
            complexity_hints: hints(&[
                ("简单提取", Simple),
                ("simple", Simple),
                ("复杂结构", Complex),
                ("nested", Complex),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Creative,
            keywords: keywords(&[
                "写", "创作", "文章", "故事", "诗", "剧本", "文案", "创意", "小说", "散文",
                "write", "compose", "create", "story", "poem", "script", "creative",
                "fiction", "essay",
            ]),
            patterns: vec![
                pattern(r"(?i)write\s+(a\s+)?(story|poem|essay|article|script)"),
                pattern(r"(?i)(compose|create)\s+(a\s+)?(creative|original)"),
                pattern(r"(?i)help\s+me\s+write"),
            ],
            priority: 6,
            complexity_hints: hints(&[
                ("短文", Simple),
                ("short", Simple),
                ("长篇", Complex),
                ("long", Complex),
                ("专业", Expert),
                ("professional", Expert),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Translation,
            keywords: keywords(&[
                "翻译", "译成", "转换语言", "translate", "translation", "into english",
                "into chinese", "to english", "to chinese",
            ]),
            patterns: vec![
                pattern(r"(?i)translate\s+(this\s+)?(text\s+)?(to|into)\s+"),
                pattern(r"(?i)(把|将).*(翻译|译)成"),
            ],
            priority: 8,
            complexity_hints: hints(&[
                ("简单句子", Simple),
                ("sentence", Simple),
                ("专业文档", Complex),
                ("technical", Complex),
                ("文学翻译", Expert),
                ("literary", Expert),
            ]),
        },
        ClassificationRule {
            task_type: TaskType::Vision,
            keywords: keywords(&[
                "图片", "图像", "照片", "看图", "图表", "截图", "识别图", "image", "picture",
                "photo", "chart", "screenshot", "diagram", "look at", "describe the image",
            ]),
            patterns: vec![
                pattern(r"(?i)(describe|explain|analyze)\s+(this\s+)?(image|picture|photo|chart)"),
                pattern(r"(?i)what\s+(is|does)\s+(in\s+)?(this\s+)?(image|picture)"),
            ],
            priority: 9,
            complexity_hints: hints(&[
                ("简单描述", Simple),
                ("simple", Simple),
                ("详细分析", Complex),
                ("detailed", Complex),
            ]),
        },
    ]
}

/// LLM-backed classifier. Sends a fixed classification prompt to a small
/// model and parses the enum literals out of the reply.
pub struct LlmClassifier {
    provider: Arc<dyn Provider>,
    model: CompactString,
    system_prompt: String,
}

const CLASSIFIER_PROMPT: &str = "You are a task classification expert. \
Analyze the user's request and decide its task type and complexity.

Task type (pick exactly one):
- chat: everyday conversation, small talk
- reasoning: logical reasoning, problem analysis
- coding: programming, code-related work
- analysis: data analysis, evaluation
- summarization: summaries, condensation
- extraction: information extraction, data parsing
- creative: creative writing, content creation
- translation: translation
- math: math computation, derivation
- vision: image or chart understanding

Complexity (pick exactly one):
- simple: simple task
- medium: medium task
- complex: complex task
- expert: expert-level task

Reply with JSON only, no other text:
{\"task_type\": \"<type>\", \"complexity\": \"<complexity>\"}";

impl LlmClassifier {
    /// Create a classifier using the given provider and the default small
    /// model.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: "gpt-4o-mini".into(),
            system_prompt: CLASSIFIER_PROMPT.to_string(),
        }
    }

    /// Use a specific model for classification calls.
    pub fn with_model(mut self, model: impl Into<CompactString>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the classification prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn parse_response(content: &str) -> (TaskType, TaskComplexity) {
        let lower = content.to_lowercase();

        // Earliest literal wins; canonical order breaks position ties.
        let task = TaskType::all()
            .into_iter()
            .filter_map(|t| lower.find(&t.to_string()).map(|pos| (pos, t)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, t)| t)
            .unwrap_or(TaskType::Chat);

        // The "complexity" field name itself contains the "complex" literal;
        // strip it before scanning for values.
        let values = lower.replace("complexity", "");
        let complexity = TaskComplexity::all()
            .into_iter()
            .filter_map(|c| values.find(&c.to_string()).map(|pos| (pos, c)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, c)| c)
            .unwrap_or(TaskComplexity::Medium);

        (task, complexity)
    }
}

#[async_trait]
impl TaskClassifier for LlmClassifier {
    async fn classify(&self, req: &CompletionRequest) -> (TaskType, TaskComplexity) {
        let user_text = req
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if user_text.is_empty() {
            return (TaskType::Chat, TaskComplexity::Medium);
        }

        let classify_req = CompletionRequest::new(
            self.model.clone(),
            vec![
                Message::system(self.system_prompt.clone()),
                Message::user(user_text),
            ],
        )
        .with_max_tokens(100)
        .with_temperature(0.0);

        match self.provider.complete(classify_req).await {
            Ok(resp) => Self::parse_response(&resp.content),
            Err(err) => {
                tracing::warn!("llm classification failed, using defaults: {err}");
                (TaskType::Chat, TaskComplexity::Medium)
            }
        }
    }

    fn name(&self) -> &'static str {
        "llm_based"
    }
}

/// Rules first; the LLM is consulted only when the rules produced plain
/// chat, and overrides when it disagrees.
pub struct CompositeClassifier {
    rule: RuleClassifier,
    llm: LlmClassifier,
}

impl CompositeClassifier {
    /// Create a composite classifier over the given provider.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            rule: RuleClassifier::new(),
            llm: LlmClassifier::new(provider),
        }
    }

    /// Create a composite from explicit parts.
    pub fn from_parts(rule: RuleClassifier, llm: LlmClassifier) -> Self {
        Self { rule, llm }
    }
}

#[async_trait]
impl TaskClassifier for CompositeClassifier {
    async fn classify(&self, req: &CompletionRequest) -> (TaskType, TaskComplexity) {
        let (task, complexity) = self.rule.classify(req).await;

        if task == TaskType::Chat {
            let (llm_task, llm_complexity) = self.llm.classify(req).await;
            if llm_task != TaskType::Chat {
                return (llm_task, llm_complexity);
            }
        }

        (task, complexity)
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}
