//! Task definitions: the system prompts and user-prompt templates behind
//! each non-chat subcommand.

use clap::ValueEnum;

/// One-shot assistant tasks. Each maps to a fixed system prompt plus a
/// user-prompt template filled with the caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Generate,
    Analyze,
    Profile,
    Scan,
    Template,
    Deploy,
}

/// Pre-built template categories offered by `streamsage template`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateCategory {
    Dashboard,
    Analytics,
    Ecommerce,
    Blog,
    Game,
    Mobile,
    Admin,
    #[value(name = "bi")]
    BusinessIntelligence,
}

/// Deployment targets covered by `streamsage deploy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeployPlatform {
    #[value(name = "streamlit-cloud")]
    StreamlitCloud,
    Heroku,
    Docker,
    Aws,
    #[value(name = "gcp")]
    GoogleCloud,
    Azure,
    Pythonanywhere,
    Railway,
}

impl TemplateCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Data Dashboard",
            Self::Analytics => "Analytics Platform",
            Self::Ecommerce => "E-commerce Site",
            Self::Blog => "Blog/Content Manager",
            Self::Game => "Game Dashboard",
            Self::Mobile => "Mobile-Responsive App",
            Self::Admin => "Admin Panel",
            Self::BusinessIntelligence => "Business Intelligence",
        }
    }

    /// The generation brief sent as the user prompt.
    pub fn brief(self) -> &'static str {
        match self {
            Self::Dashboard => {
                "Create a comprehensive data visualization dashboard with multiple chart types, filters, and interactive widgets"
            }
            Self::Analytics => {
                "Build an analytics platform with KPIs, trend analysis, and real-time data updates"
            }
            Self::Ecommerce => {
                "Develop a full e-commerce interface with product listings, cart functionality, and checkout process"
            }
            Self::Blog => {
                "Create a content management system for blog posts with categories and search functionality"
            }
            Self::Game => {
                "Build an interactive gaming dashboard with scores, leaderboards, and game statistics"
            }
            Self::Mobile => {
                "Create a mobile-first responsive application with touch-friendly interfaces"
            }
            Self::Admin => {
                "Develop a comprehensive admin panel for user management and system configuration"
            }
            Self::BusinessIntelligence => {
                "Build a business intelligence tool with advanced reporting and data insights"
            }
        }
    }
}

impl DeployPlatform {
    pub fn label(self) -> &'static str {
        match self {
            Self::StreamlitCloud => "Streamlit Cloud",
            Self::Heroku => "Heroku",
            Self::Docker => "Docker",
            Self::Aws => "AWS",
            Self::GoogleCloud => "Google Cloud",
            Self::Azure => "Azure",
            Self::Pythonanywhere => "PythonAnywhere",
            Self::Railway => "Railway",
        }
    }
}

/// System prompt for a task.
pub fn system_prompt(task: Task) -> &'static str {
    match task {
        Task::Generate => {
            "You are StreamSage, an expert Streamlit developer. Generate complete, production-ready Streamlit applications with:\n\n\
             1. Proper imports and dependencies\n\
             2. Clean, well-documented code\n\
             3. Modern Streamlit best practices\n\
             4. Error handling and validation\n\
             5. Responsive design considerations\n\
             6. Performance optimizations\n\n\
             Always include:\n\
             - Comprehensive docstrings\n\
             - Type hints where appropriate\n\
             - Meaningful variable names\n\
             - Comments explaining complex logic\n\
             - Example usage in the main section\n\n\
             Generate only the Python code without markdown formatting."
        }
        Task::Analyze => {
            "You are StreamSage, a senior Streamlit code reviewer and optimization expert. Analyze the provided Streamlit code and provide:\n\n\
             1. **Code Quality Assessment** - Overall structure, readability, best practices\n\
             2. **Performance Analysis** - Identify bottlenecks and optimization opportunities\n\
             3. **Security Review** - Check for common security issues\n\
             4. **UI/UX Evaluation** - User experience and interface design feedback\n\
             5. **Bug Detection** - Find potential issues and edge cases\n\
             6. **Improvement Suggestions** - Specific, actionable recommendations\n\
             7. **Best Practices** - Streamlit-specific tips and tricks\n\n\
             Format your response with clear sections and actionable insights. Be constructive and specific."
        }
        Task::Profile => {
            "You are StreamSage, a senior Streamlit performance optimization expert. Analyze the provided Streamlit code for:\n\n\
             1. **Performance Bottlenecks** - Identify slow operations and resource-intensive code\n\
             2. **Memory Usage** - Detect memory leaks and inefficient data structures\n\
             3. **Render Optimization** - Find unnecessary re-renders and layout issues\n\
             4. **Data Processing** - Optimize data loading and transformation\n\
             5. **Caching Opportunities** - Identify what can be cached with @st.cache_data\n\
             6. **Component Efficiency** - Suggest more efficient Streamlit components\n\
             7. **Load Time Optimization** - Reduce initial load time and improve responsiveness\n\n\
             Provide specific code improvements with before/after examples. Be technical but actionable."
        }
        Task::Scan => {
            "You are StreamSage, a cybersecurity expert specializing in Streamlit applications. Analyze the code for:\n\n\
             1. **Data Exposure** - API keys, passwords, sensitive data in code\n\
             2. **Injection Vulnerabilities** - SQL injection, code injection risks\n\
             3. **Authentication Issues** - Weak auth, session management problems\n\
             4. **Input Validation** - Missing or insufficient input sanitization\n\
             5. **File Upload Security** - Unsafe file handling\n\
             6. **Dependency Vulnerabilities** - Outdated or malicious packages\n\
             7. **Configuration Security** - Improper security settings\n\n\
             Provide a security score (1-10) and specific remediation steps."
        }
        Task::Template => {
            "You are StreamSage, a Streamlit template generation expert. Create complete, production-ready Streamlit applications with:\n\n\
             1. Modern, responsive design\n\
             2. Comprehensive functionality for the chosen category\n\
             3. Best practices and clean code\n\
             4. Interactive components and user-friendly interface\n\
             5. Proper error handling and validation\n\
             6. Mobile-responsive layout\n\
             7. Professional styling and theming\n\n\
             Include detailed comments and documentation."
        }
        Task::Deploy => {
            "You are StreamSage, a DevOps and deployment expert. Provide comprehensive deployment guides for Streamlit applications including:\n\n\
             1. **Environment Setup** - Required tools and configurations\n\
             2. **Dependency Management** - Package installation and version management\n\
             3. **Configuration Files** - All necessary config files with examples\n\
             4. **Deployment Steps** - Step-by-step deployment instructions\n\
             5. **Environment Variables** - Security and configuration management\n\
             6. **Troubleshooting** - Common issues and solutions\n\
             7. **Monitoring** - Logging and performance monitoring setup\n\n\
             Include code snippets, file structures, and best practices."
        }
    }
}

/// User-prompt template for a task, filled with the caller's input.
pub fn user_prompt(task: Task, input: &str) -> String {
    match task {
        Task::Generate => format!("Generate a complete Streamlit application for: {input}"),
        Task::Analyze => {
            format!("Analyze this Streamlit code and provide comprehensive feedback:\n\n{input}")
        }
        Task::Profile => format!(
            "Analyze this Streamlit code for performance issues and provide optimization suggestions:\n\n{input}"
        ),
        Task::Scan => format!("Security analysis of this Streamlit application:\n\n{input}"),
        Task::Template => format!("Generate a complete Streamlit template for: {input}"),
        Task::Deploy => format!("Create a comprehensive deployment guide for Streamlit on: {input}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_task_has_a_streamsage_persona() {
        for task in [
            Task::Generate,
            Task::Analyze,
            Task::Profile,
            Task::Scan,
            Task::Template,
            Task::Deploy,
        ] {
            assert!(system_prompt(task).starts_with("You are StreamSage"));
        }
    }

    #[test]
    fn user_prompt_embeds_input() {
        let prompt = user_prompt(Task::Generate, "a todo app");
        assert!(prompt.contains("a todo app"));
        assert!(prompt.starts_with("Generate a complete Streamlit application"));
    }

    #[test]
    fn code_tasks_separate_input_with_blank_line() {
        for task in [Task::Analyze, Task::Profile, Task::Scan] {
            let prompt = user_prompt(task, "import streamlit");
            assert!(prompt.contains("\n\nimport streamlit"));
        }
    }

    #[test]
    fn eight_template_categories() {
        assert_eq!(TemplateCategory::value_variants().len(), 8);
    }

    #[test]
    fn eight_deploy_platforms() {
        assert_eq!(DeployPlatform::value_variants().len(), 8);
    }

    #[test]
    fn template_briefs_are_distinct() {
        let mut briefs: Vec<&str> = TemplateCategory::value_variants()
            .iter()
            .map(|c| c.brief())
            .collect();
        briefs.sort_unstable();
        briefs.dedup();
        assert_eq!(briefs.len(), 8);
    }
}
