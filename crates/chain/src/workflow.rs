//! Model extraction from ComfyUI workflows.
//!
//! Recipes embed a ComfyUI workflow in one of two shapes: the native
//! editor format (a `nodes` array where loader values live in
//! `widgets_values`) or the API format (a dict of node objects with an
//! `inputs` map). Both are walked for the loader node types that name
//! model files.

use serde_json::Value;

/// Collect the model file names referenced by a workflow's loader nodes.
///
/// The result is sorted and de-duplicated so callers get a stable list.
pub fn extract_models(workflow: &Value) -> Vec<String> {
    let mut models = Vec::new();

    if let Some(nodes) = workflow.get("nodes").and_then(Value::as_array) {
        // Native format: nodes array.
        for node in nodes {
            collect_from_node(node, &mut models);
        }
    } else if let Some(map) = workflow.as_object() {
        // API format: every non-metadata key is a node object.
        for (key, node) in map {
            if key == "extra" || key == "_meta" || key == "links" {
                continue;
            }
            collect_from_node(node, &mut models);
        }
    }

    models.sort();
    models.dedup();
    models
}

fn collect_from_node(node: &Value, models: &mut Vec<String>) {
    let class_type = node
        .get("class_type")
        .or_else(|| node.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("");

    let inputs = node.get("inputs").and_then(Value::as_object);
    let widgets = node.get("widgets_values").and_then(Value::as_array);

    // Which input keys can carry a model name, per loader node type. The
    // native editor format keeps the same value in widgets_values[0] for
    // checkpoint and UNET loaders instead.
    let (input_keys, first_widget): (&[&str], bool) = match class_type {
        "CheckpointLoaderSimple" => (&["ckpt_name"], true),
        "UNETLoader" => (&["unet_name"], true),
        "DualCLIPLoader" => (&["clip_name1", "clip_name2"], false),
        "WanVideoModelLoader" => (&["model_name", "model"], false),
        "VAELoader" => (&["vae_name"], false),
        "CLIPLoader" => (&["clip_name"], false),
        _ => return,
    };

    for key in input_keys {
        if let Some(name) = inputs
            .and_then(|i| i.get(*key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            models.push(name.to_string());
        }
    }
    if first_widget {
        push_first_widget(widgets, models);
    }
}

fn push_first_widget(widgets: Option<&Vec<Value>>, models: &mut Vec<String>) {
    if let Some(name) = widgets
        .and_then(|w| w.first())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        models.push(name.to_string());
    }
}
