//! Starter knowledge set loaded by `clariq seed`.

/// Question/answer pairs inserted into an empty knowledge table.
pub const DEFAULT_KNOWLEDGE: &[(&str, &str)] = &[
    ("What is Python?", "Python is a popular programming language."),
    ("Who created Python?", "Python was created by Guido van Rossum."),
    ("What is AI?", "AI stands for Artificial Intelligence."),
    (
        "What is ChatGPT?",
        "ChatGPT is an AI language model developed by OpenAI.",
    ),
    (
        "How does the chatbot work?",
        "It uses NLP, a knowledge base, and web scraping.",
    ),
    ("What is OpenAI?", "OpenAI is an AI research lab."),
    ("Who developed ChatGPT?", "ChatGPT was developed by OpenAI."),
];
