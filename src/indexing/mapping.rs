use serde_json::{json, Value};

/// Settings and mappings for the class index.
///
/// Field paths here are the ones the query compiler addresses: full-text
/// fields carry a `.keyword` sub-field for sorting and terms aggregations,
/// and `class.name` carries an edge n-gram `.autocomplete` sub-field.
pub fn class_index_mapping() -> Value {
    let text_with_keyword = json!({
        "type": "text",
        "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
    });

    json!({
        "settings": {
            "analysis": {
                "filter": {
                    "autocomplete_filter": {
                        "type": "edge_ngram",
                        "min_gram": 1,
                        "max_gram": 20
                    }
                },
                "analyzer": {
                    "autocomplete": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "autocomplete_filter"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "type": { "type": "keyword" },
                "class": {
                    "properties": {
                        "host": { "type": "keyword" },
                        "termId": { "type": "keyword" },
                        "subject": text_with_keyword.clone(),
                        "classId": text_with_keyword.clone(),
                        "code": text_with_keyword.clone(),
                        "name": {
                            "type": "text",
                            "fields": {
                                "autocomplete": {
                                    "type": "text",
                                    "analyzer": "autocomplete",
                                    "search_analyzer": "standard"
                                },
                                "keyword": { "type": "keyword", "ignore_above": 256 }
                            }
                        },
                        "classAttributes": text_with_keyword.clone(),
                        "crns": { "type": "keyword" }
                    }
                },
                "sections": {
                    "properties": {
                        "crn": { "type": "keyword" },
                        "profs": { "type": "text" },
                        "online": { "type": "boolean" },
                        "classType": text_with_keyword
                    }
                }
            }
        }
    })
}
