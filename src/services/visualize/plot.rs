//! Interactive plotly.js page with a 3D/2D toggle.

use ndarray::Array2;
use serde_json::{Value, json};

use crate::utils::preview;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const PALETTE: [&str; 15] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a", "#ff9896", "#c5b0d5",
];

const HOVER_PREVIEW_CHARS: usize = 200;

/// One plotted point.
pub struct PlotPoint<'a> {
    pub id: &'a str,
    pub document: &'a str,
    pub source: &'a str,
    pub cluster: usize,
}

pub fn hover_text(id: &str, source: &str, document: &str) -> String {
    let file = source.rsplit(['/', '\\']).next().unwrap_or(source);
    let body = preview(document, HOVER_PREVIEW_CHARS).replace('\n', "<br>");
    format!(
        "<b>ID:</b> {}<br><b>File:</b> {}<br><b>Preview:</b><br>{}",
        id, file, body
    )
}

fn title(view: &str, collection: &str, dimension: usize) -> Value {
    json!({
        "text": format!(
            "{} Visualization of {} Embeddings (Original Dimensions: {})",
            view, collection, dimension
        ),
        "y": 0.95,
        "x": 0.5,
        "xanchor": "center",
        "yanchor": "top",
        "font": {"size": 24}
    })
}

/// Build the plotly figure: one 3D and one 2D trace per cluster, 3D shown
/// first, plus the toggle buttons.
pub fn build_figure(
    collection: &str,
    dimension: usize,
    points: &[PlotPoint<'_>],
    coords_2d: &Array2<f64>,
    coords_3d: &Array2<f64>,
    clusters: usize,
) -> Value {
    let mut traces_3d = Vec::with_capacity(clusters);
    let mut traces_2d = Vec::with_capacity(clusters);

    for cluster in 0..clusters {
        let members: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.cluster == cluster)
            .map(|(i, _)| i)
            .collect();
        let texts: Vec<String> = members
            .iter()
            .map(|&i| hover_text(points[i].id, points[i].source, points[i].document))
            .collect();
        let color = PALETTE[cluster % PALETTE.len()];
        let column = |coords: &Array2<f64>, axis: usize| -> Vec<f64> {
            members.iter().map(|&i| coords[[i, axis]]).collect()
        };

        traces_3d.push(json!({
            "type": "scatter3d",
            "x": column(coords_3d, 0),
            "y": column(coords_3d, 1),
            "z": column(coords_3d, 2),
            "mode": "markers",
            "marker": {"size": 5, "color": color, "opacity": 0.7},
            "text": texts,
            "hoverinfo": "text",
            "name": format!("Cluster {}", cluster),
            "scene": "scene",
            "visible": true
        }));
        traces_2d.push(json!({
            "type": "scatter",
            "x": column(coords_2d, 0),
            "y": column(coords_2d, 1),
            "mode": "markers",
            "marker": {"size": 8, "color": color, "opacity": 0.7},
            "text": texts,
            "hoverinfo": "text",
            "name": format!("Cluster {}", cluster),
            "visible": false
        }));
    }

    let show_3d: Vec<bool> = (0..clusters * 2).map(|i| i < clusters).collect();
    let show_2d: Vec<bool> = show_3d.iter().map(|v| !v).collect();

    let button_3d = json!({
        "label": "3D View",
        "method": "update",
        "args": [
            {"visible": show_3d},
            {
                "scene": {
                    "xaxis": {"title": "PCA Component 1"},
                    "yaxis": {"title": "PCA Component 2"},
                    "zaxis": {"title": "PCA Component 3"}
                },
                "xaxis": {"title": ""},
                "yaxis": {"title": ""},
                "title": title("3D", collection, dimension)
            }
        ]
    });
    let button_2d = json!({
        "label": "2D View",
        "method": "update",
        "args": [
            {"visible": show_2d},
            {
                "xaxis": {"title": "PCA Component 1"},
                "yaxis": {"title": "PCA Component 2"},
                "scene": {
                    "xaxis": {"title": ""},
                    "yaxis": {"title": ""},
                    "zaxis": {"title": ""}
                },
                "title": title("2D", collection, dimension)
            }
        ]
    });

    let mut data = traces_3d;
    data.extend(traces_2d);

    json!({
        "data": data,
        "layout": {
            "title": title("3D", collection, dimension),
            "updatemenus": [{
                "type": "buttons",
                "direction": "right",
                "x": 0.1,
                "y": 1.1,
                "showactive": true,
                "buttons": [button_3d, button_2d]
            }],
            "scene": {
                "xaxis": {"title": "PCA Component 1"},
                "yaxis": {"title": "PCA Component 2"},
                "zaxis": {"title": "PCA Component 3"}
            },
            "legend": {
                "x": 0.85,
                "y": 1,
                "traceorder": "normal",
                "font": {"family": "sans-serif", "size": 12, "color": "black"}
            },
            "margin": {"l": 0, "r": 0, "b": 0, "t": 150},
            "template": "plotly_white"
        }
    })
}

/// Standalone HTML page embedding `figure`.
pub fn render_html(title: &str, figure: &Value) -> Result<String, serde_json::Error> {
    // "</" would end the script element early.
    let data = serde_json::to_string(&figure["data"])?.replace("</", "<\\/");
    let layout = serde_json::to_string(&figure["layout"])?.replace("</", "<\\/");
    let title = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
<style>html, body {{ margin: 0; height: 100%; }} #chart {{ width: 100%; height: 100vh; }}</style>
</head>
<body>
<div id="chart"></div>
<script>
Plotly.newPlot("chart", {data}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = title,
        cdn = PLOTLY_CDN,
        data = data,
        layout = layout
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_hover_text() {
        let text = hover_text("doc_1", "sample_data/category_0/document_1.txt", "line one\nline two");
        assert_eq!(
            text,
            "<b>ID:</b> doc_1<br><b>File:</b> document_1.txt<br><b>Preview:</b><br>line one<br>line two"
        );

        let long = "x".repeat(250);
        assert!(hover_text("a", "b", &long).ends_with(&format!("{}...", "x".repeat(200))));
    }

    #[test]
    fn test_build_figure_traces() {
        let points = vec![
            PlotPoint { id: "a", document: "first", source: "a.txt", cluster: 0 },
            PlotPoint { id: "b", document: "second", source: "b.txt", cluster: 1 },
            PlotPoint { id: "c", document: "third", source: "c.txt", cluster: 1 },
        ];
        let coords_2d = array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
        let coords_3d = array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [6.0, 7.0, 8.0]];

        let figure = build_figure("docs", 1024, &points, &coords_2d, &coords_3d, 2);
        let data = figure["data"].as_array().unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data[0]["type"], "scatter3d");
        assert_eq!(data[0]["visible"], true);
        assert_eq!(data[2]["type"], "scatter");
        assert_eq!(data[2]["visible"], false);
        assert_eq!(data[1]["x"], json!([3.0, 6.0]));
        assert_eq!(data[3]["y"], json!([3.0, 5.0]));

        let buttons = &figure["layout"]["updatemenus"][0]["buttons"];
        assert_eq!(buttons[1]["args"][0]["visible"], json!([false, false, true, true]));
        assert!(
            figure["layout"]["title"]["text"]
                .as_str()
                .unwrap()
                .contains("Original Dimensions: 1024")
        );
    }

    #[test]
    fn test_render_html_escapes_script_end() {
        let figure = json!({"data": [{"text": ["</script><b>x</b>"]}], "layout": {}});
        let html = render_html("a <b> title", &figure).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<\\/script>"));
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains("a &lt;b&gt; title"));
    }
}
