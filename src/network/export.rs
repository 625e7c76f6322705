//! Whole-graph serialization: node-link JSON, GraphML, GEXF and GML.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use super::graph::{CitationGraph, WorkNode};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported graph format: {0}")]
    UnsupportedFormat(String),
}

/// Graph serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    /// `{"nodes": [...], "links": [...]}`
    #[default]
    Json,
    GraphMl,
    Gexf,
    Gml,
}

impl GraphFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::GraphMl => "graphml",
            Self::Gexf => "gexf",
            Self::Gml => "gml",
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for GraphFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "node-link" | "node_link" => Ok(Self::Json),
            "graphml" => Ok(Self::GraphMl),
            "gexf" => Ok(Self::Gexf),
            "gml" => Ok(Self::Gml),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Serialize the whole graph
pub fn export_graph(graph: &CitationGraph, format: GraphFormat) -> Result<String, ExportError> {
    match format {
        GraphFormat::Json => to_node_link(graph),
        GraphFormat::GraphMl => to_graphml(graph),
        GraphFormat::Gexf => to_gexf(graph),
        GraphFormat::Gml => Ok(to_gml(graph)),
    }
}

/// Serialize the graph and write it to `path`, replacing any existing file
pub fn save_graph(graph: &CitationGraph, path: &Path, format: GraphFormat) -> Result<(), ExportError> {
    let text = export_graph(graph, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Saved {} graph to {}",
        format,
        path.display()
    );
    Ok(())
}

fn to_node_link(graph: &CitationGraph) -> Result<String, ExportError> {
    let nodes: Vec<&WorkNode> = graph.nodes().collect();
    let links: Vec<_> = graph
        .edges()
        .map(|(source, target)| json!({"source": source, "target": target}))
        .collect();
    let doc = json!({
        "directed": true,
        "multigraph": true,
        "graph": {},
        "nodes": nodes,
        "links": links,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn xml_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn finish(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, text: &str) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new("data").with_attributes([("key", key)])))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("data")))?;
    Ok(())
}

const GRAPHML_KEYS: [(&str, &str, &str); 3] = [("d0", "title", "string"), ("d1", "year", "int"), ("d2", "doi", "string")];

fn to_graphml(graph: &CitationGraph) -> Result<String, ExportError> {
    let mut w = xml_writer();
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(
        BytesStart::new("graphml").with_attributes([("xmlns", "http://graphml.graphdrawing.org/xmlns")]),
    ))?;

    for (id, name, ty) in GRAPHML_KEYS {
        w.write_event(Event::Empty(BytesStart::new("key").with_attributes([
            ("id", id),
            ("for", "node"),
            ("attr.name", name),
            ("attr.type", ty),
        ])))?;
    }

    w.write_event(Event::Start(
        BytesStart::new("graph").with_attributes([("id", "G"), ("edgedefault", "directed")]),
    ))?;

    for node in graph.nodes() {
        let values = [
            ("d0", node.title.clone()),
            ("d1", node.year.map(|y| y.to_string())),
            ("d2", node.doi.clone()),
        ];
        let start = BytesStart::new("node").with_attributes([("id", node.id.as_str())]);
        if values.iter().all(|(_, v)| v.is_none()) {
            w.write_event(Event::Empty(start))?;
            continue;
        }
        w.write_event(Event::Start(start))?;
        for (key, value) in values.iter().filter_map(|(k, v)| v.as_deref().map(|v| (*k, v))) {
            write_data(&mut w, key, value)?;
        }
        w.write_event(Event::End(BytesEnd::new("node")))?;
    }

    for (i, (source, target)) in graph.edges().enumerate() {
        let id = format!("e{}", i);
        w.write_event(Event::Empty(BytesStart::new("edge").with_attributes([
            ("id", id.as_str()),
            ("source", source),
            ("target", target),
        ])))?;
    }

    w.write_event(Event::End(BytesEnd::new("graph")))?;
    w.write_event(Event::End(BytesEnd::new("graphml")))?;
    Ok(finish(w))
}

fn to_gexf(graph: &CitationGraph) -> Result<String, ExportError> {
    let mut w = xml_writer();
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(
        BytesStart::new("gexf").with_attributes([("xmlns", "http://gexf.net/1.2"), ("version", "1.2")]),
    ))?;
    w.write_event(Event::Start(
        BytesStart::new("graph").with_attributes([("mode", "static"), ("defaultedgetype", "directed")]),
    ))?;

    w.write_event(Event::Start(BytesStart::new("attributes").with_attributes([("class", "node")])))?;
    for (id, title, ty) in [("0", "year", "integer"), ("1", "doi", "string")] {
        w.write_event(Event::Empty(
            BytesStart::new("attribute").with_attributes([("id", id), ("title", title), ("type", ty)]),
        ))?;
    }
    w.write_event(Event::End(BytesEnd::new("attributes")))?;

    w.write_event(Event::Start(BytesStart::new("nodes")))?;
    for node in graph.nodes() {
        let label = node.title.as_deref().unwrap_or(&node.id);
        let start = BytesStart::new("node").with_attributes([("id", node.id.as_str()), ("label", label)]);
        let values = [("0", node.year.map(|y| y.to_string())), ("1", node.doi.clone())];
        if values.iter().all(|(_, v)| v.is_none()) {
            w.write_event(Event::Empty(start))?;
            continue;
        }
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Start(BytesStart::new("attvalues")))?;
        for (key, value) in values.iter().filter_map(|(k, v)| v.as_deref().map(|v| (*k, v))) {
            w.write_event(Event::Empty(
                BytesStart::new("attvalue").with_attributes([("for", key), ("value", value)]),
            ))?;
        }
        w.write_event(Event::End(BytesEnd::new("attvalues")))?;
        w.write_event(Event::End(BytesEnd::new("node")))?;
    }
    w.write_event(Event::End(BytesEnd::new("nodes")))?;

    w.write_event(Event::Start(BytesStart::new("edges")))?;
    for (i, (source, target)) in graph.edges().enumerate() {
        let id = i.to_string();
        w.write_event(Event::Empty(BytesStart::new("edge").with_attributes([
            ("id", id.as_str()),
            ("source", source),
            ("target", target),
        ])))?;
    }
    w.write_event(Event::End(BytesEnd::new("edges")))?;

    w.write_event(Event::End(BytesEnd::new("graph")))?;
    w.write_event(Event::End(BytesEnd::new("gexf")))?;
    Ok(finish(w))
}

fn gml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('&', "&amp;").replace('"', "&quot;"))
}

fn to_gml(graph: &CitationGraph) -> String {
    let mut out = String::from("graph [\n  directed 1\n  multigraph 1\n");
    let mut positions = std::collections::HashMap::new();

    for (pos, node) in graph.nodes().enumerate() {
        positions.insert(node.id.as_str(), pos);
        out.push_str(&format!("  node [\n    id {}\n    label {}\n", pos, gml_quote(&node.id)));
        if let Some(title) = &node.title {
            out.push_str(&format!("    title {}\n", gml_quote(title)));
        }
        if let Some(year) = node.year {
            out.push_str(&format!("    year {}\n", year));
        }
        if let Some(doi) = &node.doi {
            out.push_str(&format!("    doi {}\n", gml_quote(doi)));
        }
        out.push_str("  ]\n");
    }

    for (source, target) in graph.edges() {
        if let (Some(s), Some(t)) = (positions.get(source), positions.get(target)) {
            out.push_str(&format!("  edge [\n    source {}\n    target {}\n  ]\n", s, t));
        }
    }

    out.push_str("]\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkBuilder;
    use tempfile::tempdir;

    fn sample_graph() -> CitationGraph {
        let mut graph = CitationGraph::new();
        graph.add_work(
            &WorkBuilder::new("https://openalex.org/W1")
                .title("Tree rings & \"radiocarbon\"")
                .publication_year(2013)
                .doi("https://doi.org/10.2458/azu_js_rc.55.16947")
                .references(["https://openalex.org/W2", "https://openalex.org/W3"])
                .build(),
        );
        graph
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("GraphML".parse::<GraphFormat>().unwrap(), GraphFormat::GraphMl);
        assert_eq!("json".parse::<GraphFormat>().unwrap(), GraphFormat::Json);
        assert_eq!(" gexf ".parse::<GraphFormat>().unwrap(), GraphFormat::Gexf);
        assert!(matches!(
            "dot".parse::<GraphFormat>(),
            Err(ExportError::UnsupportedFormat(name)) if name == "dot"
        ));
    }

    #[test]
    fn test_node_link_shape() {
        let text = export_graph(&sample_graph(), GraphFormat::Json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(doc["directed"], true);
        assert_eq!(doc["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(doc["nodes"][0]["year"], 2013);
        assert!(doc["nodes"][1].get("title").is_none());
        assert_eq!(
            doc["links"][1],
            serde_json::json!({"source": "https://openalex.org/W1", "target": "https://openalex.org/W3"})
        );
    }

    #[test]
    fn test_graphml_escapes_and_counts() {
        let text = export_graph(&sample_graph(), GraphFormat::GraphMl).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("edgedefault=\"directed\""));
        assert!(text.contains("Tree rings &amp;"));
        assert_eq!(text.matches("<node ").count(), 3);
        assert_eq!(text.matches("<edge ").count(), 2);
    }

    #[test]
    fn test_gexf_labels() {
        let text = export_graph(&sample_graph(), GraphFormat::Gexf).unwrap();
        assert!(text.contains("label=\"https://openalex.org/W2\""));
        assert!(text.contains("<attvalue for=\"0\" value=\"2013\"/>"));
        assert_eq!(text.matches("<edge ").count(), 2);
    }

    #[test]
    fn test_gml_indices() {
        let text = export_graph(&sample_graph(), GraphFormat::Gml).unwrap();
        assert!(text.starts_with("graph [\n  directed 1\n"));
        assert!(text.contains("title \"Tree rings &amp; &quot;radiocarbon&quot;\""));
        assert!(text.contains("source 0\n    target 2"));
    }

    #[test]
    fn test_save_graph_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("graph.json");
        save_graph(&sample_graph(), &path, GraphFormat::Json).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_graph_onto_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let result = save_graph(&sample_graph(), dir.path(), GraphFormat::GraphMl);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
