use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

pub const CHUNK_TOKENIZER: &str = "chunk_text";
pub const SEQ_FIELD: &str = "seq";
pub const TEXT_FIELD: &str = "text";

/// `seq` holds the chunk's store position; `text` is only indexed, never stored.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _seq_field = schema_builder.add_u64_field(SEQ_FIELD, STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(CHUNK_TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _text_field = schema_builder.add_text_field(TEXT_FIELD, text_options);
	schema_builder.build()
}

/// Lower-cased split on whitespace and punctuation. No stop words, no stemming.
pub fn chunk_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.build()
}

pub fn register_tokenizer(index: &Index) {
	index.tokenizers().register(CHUNK_TOKENIZER, chunk_analyzer());
}
