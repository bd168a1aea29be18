//! Instruction template for topic identification.

use serde_json::json;

use postlab_types::TopicItem;

/// Fixed instruction sent ahead of every item. Asks for a JSON object mapping
/// one index to a topic name.
pub const TOPIC_PROMPT: &str = r#"
Você é um assistente que identifica tópicos com base em uma lista de palavras-chave e um texto representativo de tokens fornecido.

Eu vou fornecer uma lista de palavras-chave e uma string de tokens representando o contexto do tópico. Sua tarefa é analisar a lista de palavras-chave e o texto representativo para identificar o tópico mais relevante.

Aqui está o que você deve fazer:
1. Analise a lista de palavras-chave e a string de tokens associada.
2. Use as palavras-chave e o texto representativo para identificar o tópico mais relevante.
3. Retorne um JSON que associe o índice ao nome do tópico correspondente.

Modelo de entrada:
{
    "palavras-chave": ["palavra1", "palavra2"],
    "texto": "string de tokens"
}

A sua resposta deve ser neste modelo JSON:
{
    "0": "Nome do tópico"
}

Me retorne somente o formato em JSON.

Agora, analise esta entrada:
"#;

/// Render the full prompt for one item.
///
/// The item is serialized with the same keys the template describes.
pub fn render_prompt(item: &TopicItem) -> String {
    let payload = json!({
        "palavras-chave": item.keywords,
        "texto": item.text,
    });
    format!("{}{}", TOPIC_PROMPT, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_appends_item() {
        let item = TopicItem::new(["aborto", "direito"], "abort direit legal");
        let prompt = render_prompt(&item);

        assert!(prompt.starts_with(TOPIC_PROMPT));
        assert!(prompt.ends_with(
            r#"{"palavras-chave":["aborto","direito"],"texto":"abort direit legal"}"#
        ));
    }

    #[test]
    fn test_render_prompt_keeps_non_ascii() {
        let item = TopicItem::new(["ciência"], "ciência");
        assert!(render_prompt(&item).contains("ciência"));
    }
}
