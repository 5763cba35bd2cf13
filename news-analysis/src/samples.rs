//! Sample inputs offered by the rendering layer for each task.

use crate::types::TaskKind;

/// Separates question from context in question-answering samples.
pub const QA_SEPARATOR: &str = "||";

const SENTIMENT: &[&str] = &[
    "I love this product! It works perfectly.",
    "This is the worst experience I've ever had.",
    "I'm not sure how I feel about this.",
    "Absolutely fantastic service!",
    "The food was cold and tasteless.",
    "It's just average, not good or bad.",
];

const NER: &[&str] = &[
    "Barack Obama was born in Hawaii.",
    "Apple released the new iPhone in California.",
    "The Eiffel Tower is in Paris.",
    "Elon Musk founded SpaceX.",
    "The Olympics will be held in Tokyo.",
    "Mount Everest is the tallest mountain.",
];

const SUMMARIZE: &[&str] = &[
    "Artificial intelligence is transforming industries by automating tasks, improving efficiency, and enabling new capabilities that were previously impossible. Companies are investing heavily in AI research and development to stay competitive. As AI systems become more advanced, ethical considerations and regulations are increasingly important. The impact of AI on the workforce is a topic of ongoing debate, with both opportunities and challenges ahead. Ultimately, AI has the potential to reshape society in profound ways.",
    "The history of the internet dates back to the 1960s, evolving from a military project to the global network we use today. Early networks like ARPANET laid the foundation for modern connectivity. The invention of the World Wide Web in 1989 revolutionized information sharing and communication. Today, billions of people rely on the internet for work, education, and entertainment. The internet continues to evolve, shaping economies and cultures worldwide.",
    "The company reported record profits this quarter, driven by strong sales and innovative new products. Executives credited the success to a focus on customer satisfaction and operational efficiency. The launch of a new product line exceeded expectations, attracting positive media attention. Shareholders responded favorably, with stock prices reaching an all-time high. The company plans to reinvest profits into research and development for continued growth.",
];

const EMOTION: &[&str] = &[
    "I am so excited for my birthday party!",
    "This news makes me really sad.",
    "I'm furious about what happened yesterday.",
    "I'm terrified of spiders.",
    "I feel grateful for my friends and family.",
    "I'm disappointed with the results.",
];

const QA: &[&str] = &[
    "What is the capital of France?||Paris is the capital and most populous city of France.",
    "Who wrote Hamlet?||Hamlet is a tragedy written by William Shakespeare sometime between 1599 and 1601.",
    "What is the boiling point of water?||Water boils at 100 degrees Celsius at standard atmospheric pressure.",
    "Who painted the Mona Lisa?||The Mona Lisa was painted by Leonardo da Vinci in the early 16th century.",
    "What year did the first man land on the moon?||Neil Armstrong landed on the moon in 1969.",
];

pub fn sample_texts(kind: TaskKind) -> &'static [&'static str] {
    match kind {
        TaskKind::Sentiment => SENTIMENT,
        TaskKind::Ner => NER,
        TaskKind::Summarize => SUMMARIZE,
        TaskKind::Emotion => EMOTION,
        TaskKind::Qa => QA,
    }
}

/// Split a `question||context` sample. Samples without a separator are all question.
pub fn split_qa_sample(sample: &str) -> (&str, Option<&str>) {
    match sample.split_once(QA_SEPARATOR) {
        Some((question, context)) => (question.trim(), Some(context.trim())),
        None => (sample.trim(), None),
    }
}
