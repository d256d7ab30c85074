//! Canonical text rendering of a post and its thread, used as embedding input.

use crate::{
	post::{Embed, PostView},
	thread::{ThreadCache, walk_ancestors},
};

const THREAD_SEPARATOR: &str = "\n\n---\n\n";
const COMPONENT_SEPARATOR: &str = "\n\n";

pub fn serialize_post(cache: &dyn ThreadCache, post: &PostView) -> String {
	let thread = walk_ancestors(cache, post);

	thread
		.iter()
		.enumerate()
		.map(|(index, item)| render_item(item, index == 0))
		.collect::<Vec<_>>()
		.join(THREAD_SEPARATOR)
}

pub fn markdown_quote(text: &str) -> String {
	format!("> {}", text.replace('\n', "\n> "))
}

fn render_item(item: &PostView, is_root: bool) -> String {
	let verb = if is_root { "says" } else { "replies" };
	let introduction = format!(
		"{} (@{}) {verb}:\n",
		item.author.display_name_or_handle(),
		item.author.handle
	);
	let mut components = Vec::with_capacity(3);
	let text = item.record.text.trim();

	if !text.is_empty() {
		components.push(text.to_string());
	}
	if let Some(quote) = render_quote(&item.embed) {
		components.push(quote);
	}
	if let Some(images) = render_images(&item.embed) {
		components.push(images);
	}

	introduction + &markdown_quote(&components.join(COMPONENT_SEPARATOR))
}

fn render_quote(embed: &Embed) -> Option<String> {
	let record = match embed {
		Embed::Record { record } | Embed::RecordWithMedia { record, .. } => record,
		Embed::None | Embed::Images { .. } => return None,
	};
	let text = record.text.as_deref()?.trim();

	if text.is_empty() {
		return None;
	}

	let attribution = match record.author.as_ref() {
		Some(author) =>
			format!("Quote post from {} (@{}):\n", author.display_name_or_handle(), author.handle),
		None => "Quote post:\n".to_string(),
	};

	Some(attribution + &markdown_quote(text))
}

fn render_images(embed: &Embed) -> Option<String> {
	match embed.images().len() {
		0 => None,
		1 => Some("[1 image attached]".to_string()),
		count => Some(format!("[{count} images attached]")),
	}
}
