// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Literature references

use crate::node::NodeHandle;

decorator! {
    /// Journal article a structure was described in
    JournalArticle / JournalArticleConst on NodeHandle {
        factory: JournalArticleFactory / JournalArticleConstFactory,
        arity: NODE,
        category: "publication",
        keys: {
            title / set_title: String = "title", false;
            journal / set_journal: String = "journal", false;
            pubmed_id / set_pubmed_id: String = "pubmed id", false;
            year / set_year: i64 = "year", false;
            authors / set_authors: Vec<String> = "authors", false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileHandle;
    use crate::node::NodeType;

    #[test]
    fn test_article_needs_every_field() {
        let file = FileHandle::create_in_buffer().unwrap();
        let node = file
            .get_root_node()
            .add_child("citation", NodeType::Custom)
            .unwrap();
        let articles = JournalArticleFactory::new(&file).unwrap();
        let article = articles.get(&node, None).unwrap();
        article.set_title("Integrative structure".to_string()).unwrap();
        article.set_journal("Nature".to_string()).unwrap();
        article.set_pubmed_id("12345".to_string()).unwrap();
        article.set_year(2012).unwrap();
        assert!(!articles.get_is(&node, None).unwrap());

        article
            .set_authors(vec!["Smith J".to_string(), "Doe A".to_string()])
            .unwrap();
        assert!(articles.get_is(&node, None).unwrap());
        assert_eq!(article.authors().unwrap().len(), 2);
        assert_eq!(article.year().unwrap(), 2012);
    }
}
