use clap::Parser;
use std::process::ExitCode;
use td_cli::Settings;
use td_core::logging::init_logging;
use td_core::{Article, CategoryScore, ClassifiedArticle, Language, Result, SummarizedArticle, SummarySource};
use td_fetchers::{FetcherAgent, TagEnricher};
use td_inference::{create_model, ClassifierAgent, SummarizerAgent};
use td_notify::{NotifierAgent, NotifierConfig};

const SUMMARY_SAMPLE: usize = 3;

/// Exercise each stage against the live configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Stage-by-stage self test", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Post a real notification built from two sample articles
    #[arg(long)]
    send_test: bool,
}

fn sample(title: &str, url: &str, summary: &str, category: &str) -> SummarizedArticle {
    let article = Article {
        url: url.to_string(),
        title: title.to_string(),
        source: "selftest".to_string(),
        published_at: None,
        content: summary.to_string(),
        language: Language::Japanese,
        author: None,
        tags: vec![],
        trust_score: 8,
    };
    SummarizedArticle {
        classified: ClassifiedArticle::new(
            article,
            vec![CategoryScore {
                name: category.to_string(),
                score: 1.0,
            }],
        ),
        summary: summary.to_string(),
        summary_source: SummarySource::Primary,
    }
}

fn sample_articles() -> Vec<SummarizedArticle> {
    vec![
        sample(
            "テスト記事: AWS Lambda の新機能",
            "https://example.com/test-article",
            "これはテスト用の記事要約です。AWS Lambda の新機能について説明しています。",
            "cloud",
        ),
        sample(
            "テスト記事: GPT-4 の活用法",
            "https://example.com/test-article-2",
            "これもテスト用の記事要約です。GPT-4 の活用法について説明しています。",
            "ai",
        ),
    ]
}

async fn send_test(settings: &Settings) -> Result<bool> {
    println!("📱 Sending test notification...");
    let notifier = NotifierAgent::new(
        NotifierConfig::new(settings.webhook_url()?),
        settings.load_categories()?,
        None,
    )?;
    Ok(notifier.send_notification(&sample_articles()).await)
}

async fn run_stages(settings: &Settings) -> Result<bool> {
    let categories = settings.load_categories()?;
    let model = create_model(&settings.model_settings()?)?;

    println!("📰 Fetch");
    let fetcher = FetcherAgent::new(
        settings.fetcher_config(&categories),
        categories.clone(),
        TagEnricher::new(model.clone()),
    )?;
    let articles = fetcher.fetch_articles().await;
    println!("   {} articles", articles.len());
    for article in articles.iter().take(SUMMARY_SAMPLE) {
        println!("   - [{}] {}", article.trust_score, article.title);
    }
    if articles.is_empty() {
        println!("❌ No articles fetched");
        return Ok(false);
    }

    println!("🏷️ Classify");
    let classifier = ClassifierAgent::new(categories.clone(), settings.classification_strategy(model.clone()));
    let classified = classifier.classify_articles(articles).await;
    for name in categories.names() {
        let count = classified.iter().filter(|a| a.has_category(name)).count();
        println!("   {}: {}", name, count);
    }
    if classified.is_empty() {
        println!("❌ No article matched a category");
        return Ok(false);
    }

    println!("📝 Summarize (first {})", SUMMARY_SAMPLE);
    let summarizer = SummarizerAgent::new(model.clone());
    let summarized = summarizer
        .summarize_articles(classified.into_iter().take(SUMMARY_SAMPLE).collect())
        .await;
    for article in &summarized {
        println!("   - {} ({})", article.article().title, article.summary_source);
        println!("     {}", article.summary);
    }

    println!("📨 Notify (dry run)");
    let webhook_url = settings.webhook_url().unwrap_or("http://localhost/dry-run");
    let notifier = NotifierAgent::new(
        NotifierConfig {
            dry_run: true,
            ..NotifierConfig::new(webhook_url)
        },
        categories,
        model,
    )?;
    let payload = notifier.build_payload(&summarized, None);
    println!("{}", payload);
    Ok(notifier.send_notification(&summarized).await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.settings.log_level);

    println!("🚀 Self test");
    let outcome = if cli.send_test {
        send_test(&cli.settings).await
    } else {
        run_stages(&cli.settings).await
    };

    match outcome {
        Ok(true) => {
            println!("✅ Self test passed");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("❌ Self test failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("❌ Self test aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
