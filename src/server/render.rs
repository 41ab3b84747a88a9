//! HTML rendering for the chat page.
//!
//! Images are inlined as base64 `data:` URIs so the page needs no static file
//! routes. Avatars are read from disk on every render.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::{ChatMessage, DocumentsConfig, PageConfig, Role};

pub const CSS: &str = r#"
<style>
body {
    font-family: "Source Sans Pro", sans-serif; margin: 0; display: flex; background-color: #0e1117; color: #fafafa
}
main {
    flex: 1; padding: 2rem 3rem; max-width: 60rem
}
aside {
    width: 40%; max-width: 28rem; padding: 2rem; background-color: #262730
}
aside img {
    max-width: 100%
}
.intro {
    display: flex; gap: 1.5rem; align-items: flex-start
}
.intro .portrait {
    width: 27%
}
.intro .portrait img {
    max-width: 100%; border-radius: 0.5rem
}
.intro ul {
    list-style-position: inside
}
form {
    margin: 1.5rem 0
}
form input[type=text] {
    width: 100%; padding: 0.6rem; border-radius: 0.5rem; border: 1px solid #475063; background-color: #262730; color: #fff
}
.error {
    padding: 1rem; border-radius: 0.5rem; margin-bottom: 1rem; background-color: #7d2a2a
}
.chat-message {
    padding: 1.5rem; border-radius: 0.5rem; margin-bottom: 1rem; display: flex
}
.chat-message.user {
    background-color: #2b313e
}
.chat-message.bot {
    background-color: #475063
}
.chat-message .avatar {
  width: 20%;
}
.chat-message .avatar img {
  max-width: 78px;
  max-height: 78px;
  border-radius: 50%;
  object-fit: cover;
}
.chat-message .message {
  width: 80%;
  padding: 0 1.5rem;
  color: #fff;
}
</style>
"#;

pub const MESSAGE_TEMPLATE: &str = r#"
<div class="chat-message {{CLASS}}">
    <div class="avatar">
        {{IMG}}
    </div>
    <div class="message">{{MSG}}</div>
</div>
"#;

/// Read an image and encode it as a `data:` URI.
pub fn image_data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for(path),
        STANDARD.encode(bytes)
    ))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// `<img>` tag for a local image, or nothing if it cannot be read.
fn image_tag(path: &Path, alt: &str) -> String {
    match image_data_uri(path) {
        Ok(uri) => format!(
            "<img src='{}' alt='{}'>",
            uri,
            html_escape::encode_single_quoted_attribute(alt)
        ),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "image unavailable");
            String::new()
        }
    }
}

/// Render one transcript entry with its avatar.
pub fn render_message(role: Role, content: &str, avatar: &str) -> String {
    let class = match role {
        Role::Human => "user",
        Role::Ai => "bot",
    };
    let content = html_escape::encode_text(content).replace('\n', "<br>");

    MESSAGE_TEMPLATE
        .replace("{{CLASS}}", class)
        .replace("{{IMG}}", avatar)
        .replace("{{MSG}}", &content)
}

/// Render the transcript, alternating user and bot avatars by position.
pub fn render_transcript(history: &[ChatMessage], documents: &DocumentsConfig) -> String {
    if history.is_empty() {
        return String::new();
    }

    let user_avatar = image_tag(&documents.user_avatar, "user avatar");
    let bot_avatar = image_tag(&documents.bot_avatar, "bot avatar");

    history
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let role = Role::for_index(i);
            let avatar = match role {
                Role::Human => &user_avatar,
                Role::Ai => &bot_avatar,
            };
            render_message(role, &message.content, avatar)
        })
        .collect()
}

/// What a single page render shows.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub history: &'a [ChatMessage],
    pub error: Option<&'a str>,
}

pub fn render_page(page: &PageConfig, documents: &DocumentsConfig, view: &PageView<'_>) -> String {
    let esc = |s: &str| html_escape::encode_text(s).into_owned();
    let attr = |s: &str| html_escape::encode_double_quoted_attribute(s).into_owned();

    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n",
        esc(&page.title)
    );
    html.push_str(CSS);
    html.push_str("</head>\n<body>\n<main>\n");

    let sources = if page.sources.is_empty() {
        String::new()
    } else {
        let items: String = page
            .sources
            .iter()
            .map(|source| format!("<li>{}</li>\n", esc(source)))
            .collect();
        format!("<ul>\n{items}</ul>\n")
    };
    html.push_str(&format!(
        "<section class=\"intro\">\n<div class=\"portrait\">{}</div>\n<div>\n\
         <h1>{}</h1>\n<p>{}</p>\n{sources}<p>{}</p>\n</div>\n</section>\n",
        image_tag(&documents.portrait, "portrait"),
        esc(&page.header),
        esc(&page.intro),
        esc(&page.language_note),
    ));

    html.push_str(&format!(
        "<form method=\"post\" action=\"/\">\n<label for=\"question\">{}</label>\n\
         <input type=\"text\" id=\"question\" name=\"question\" placeholder=\"{}\" autofocus>\n\
         </form>\n",
        esc(&page.input_label),
        attr(&page.placeholder),
    ));

    if let Some(error) = view.error {
        html.push_str(&format!("<div class=\"error\">{}</div>\n", esc(error)));
    }

    html.push_str("<section class=\"transcript\">\n");
    html.push_str(&render_transcript(view.history, documents));
    html.push_str("</section>\n</main>\n<aside>\n");

    if let Some(ref url) = page.repo_url {
        html.push_str(&format!(
            "<p>GitHub-Repo: <a href=\"{}\">{}</a></p>\n",
            attr(url),
            esc(url)
        ));
    }
    html.push_str("<p>Workflow of the chatbot:</p>\n");
    html.push_str(&image_tag(&documents.diagram, "workflow diagram"));
    html.push_str("\n</aside>\n</body>\n</html>\n");

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents_in(dir: &Path) -> DocumentsConfig {
        std::fs::write(dir.join("question.png"), b"user-bytes").unwrap();
        std::fs::write(dir.join("bot.png"), b"bot-bytes").unwrap();
        DocumentsConfig {
            docs_dir: dir.to_path_buf(),
            user_avatar: dir.join("question.png"),
            bot_avatar: dir.join("bot.png"),
            portrait: dir.join("missing.jpg"),
            diagram: dir.join("missing.png"),
        }
    }

    #[test]
    fn test_image_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(image_data_uri(&path).unwrap(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_render_message_escapes_content() {
        let html = render_message(Role::Ai, "<script>alert(1)</script>", "");
        assert!(html.contains("chat-message bot"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_transcript_alternates_avatars() {
        let dir = tempfile::tempdir().unwrap();
        let documents = documents_in(dir.path());
        let user_uri = image_data_uri(&documents.user_avatar).unwrap();
        let bot_uri = image_data_uri(&documents.bot_avatar).unwrap();

        let history = vec![
            ChatMessage::human("Where did he work?"),
            ChatMessage::ai("At fka GmbH."),
        ];
        let html = render_transcript(&history, &documents);

        let user_pos = html.find(&user_uri).unwrap();
        let bot_pos = html.find(&bot_uri).unwrap();
        assert!(user_pos < bot_pos);
        assert_eq!(html.matches("chat-message user").count(), 1);
        assert_eq!(html.matches("chat-message bot").count(), 1);
    }

    #[test]
    fn test_page_renders_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let documents = documents_in(dir.path());
        let page = PageConfig {
            repo_url: Some("https://example.com/repo".to_string()),
            ..Default::default()
        };

        let html = render_page(
            &page,
            &documents,
            &PageView {
                history: &[],
                error: Some("chat API error"),
            },
        );
        assert!(html.contains("<title>Chat with me!</title>"));
        assert!(html.contains("name=\"question\""));
        assert!(html.contains("https://example.com/repo"));
        assert!(html.contains("class=\"error\""));
        assert!(!html.contains("chat-message user"));
    }

    #[test]
    fn test_page_escapes_configured_text() {
        let dir = tempfile::tempdir().unwrap();
        let documents = documents_in(dir.path());
        let page = PageConfig {
            header: "Tom & <Jerry>".to_string(),
            placeholder: "Ask \"anything\"".to_string(),
            sources: vec!["CV".to_string(), "Letter <2019>".to_string()],
            ..Default::default()
        };

        let html = render_page(&page, &documents, &PageView::default());
        assert!(html.contains("<h1>Tom &amp; &lt;Jerry&gt;</h1>"));
        assert!(html.contains("placeholder=\"Ask &quot;anything&quot;\""));
        assert!(html.contains("<ul>\n<li>CV</li>\n<li>Letter &lt;2019&gt;</li>\n</ul>"));
        assert!(!html.contains("class=\"error\""));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
