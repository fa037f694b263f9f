/// Feeds polled when the keyword configuration does not list its own.
pub const DEFAULT_FEEDS: &[&str] = &[
    // Vendor blogs
    "https://aws.amazon.com/jp/blogs/news/feed/",
    "https://cloud.google.com/blog/ja/rss",
    "https://azure.microsoft.com/ja-jp/blog/feed/",
    "https://kubernetes.io/feed.xml",
    "https://www.docker.com/blog/feed/",
    // Engineering blogs
    "https://dev.classmethod.jp/feed/",
    "https://tech.mercari.com/rss",
    "https://engineering.linecorp.com/ja/blog/rss2",
    "https://techblog.yahoo.co.jp/rss/",
    "https://developers.cyberagent.co.jp/blog/feed/",
    "https://tech.recruit-mp.co.jp/rss",
    "https://blog.cloudflare.com/rss/",
    // Community
    "https://zenn.dev/feed",
    "https://qiita.com/tags/aws/feed",
    "https://qiita.com/tags/gcp/feed",
    "https://qiita.com/tags/azure/feed",
    "https://qiita.com/tags/kubernetes/feed",
    // AI / ML
    "https://ai.googleblog.com/feeds/posts/default",
    "https://openai.com/blog/rss.xml",
    "https://blog.research.google/feeds/posts/default",
];

/// Reputation per domain fragment, checked in order against the host.
pub const DOMAIN_TRUST: &[(&str, u8)] = &[
    ("aws.amazon.com", 10),
    ("cloud.google.com", 10),
    ("azure.microsoft.com", 10),
    ("kubernetes.io", 10),
    ("docker.com", 9),
    ("openai.com", 10),
    ("ai.googleblog.com", 10),
    ("blog.research.google", 10),
    ("dev.classmethod.jp", 9),
    ("tech.mercari.com", 9),
    ("engineering.linecorp.com", 9),
    ("techblog.yahoo.co.jp", 9),
    ("developers.cyberagent.co.jp", 9),
    ("tech.recruit-mp.co.jp", 9),
    ("blog.cloudflare.com", 9),
    ("zenn.dev", 7),
    ("qiita.com", 6),
    ("dev.to", 6),
    ("medium.com", 5),
    ("hackernoon.com", 6),
    ("towards-ai.net", 6),
    ("towardsdatascience.com", 7),
    ("github.io", 5),
    ("herokuapp.com", 4),
    ("netlify.app", 4),
    ("vercel.app", 4),
];

pub const OFFICIAL_DOMAINS: &[&str] = &[
    "aws.amazon.com",
    "cloud.google.com",
    "azure.microsoft.com",
    "kubernetes.io",
    "docker.com",
    "openai.com",
];

pub fn default_feeds() -> Vec<String> {
    DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect()
}
