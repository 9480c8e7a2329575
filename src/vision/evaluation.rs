//! Aggregation of evaluation rows into scene statistics

use super::models::{ClassStatistic, EvaluationItem, NewScene, SceneCreate, AVERAGE_CLASS_NAME};
use crate::error::{Result, VisionError};

/// Per-class rows plus the aggregate row of one scene evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneEvaluation {
    pub class_statistics: Vec<ClassStatistic>,
    pub overall: Option<ClassStatistic>,
}

impl SceneEvaluation {
    /// Split evaluation rows into per-class statistics and the overall score.
    ///
    /// An empty slice yields no statistics and no overall score. Otherwise the
    /// first row named "average" is the overall score and is required; every
    /// "average" row is excluded from the per-class list.
    pub fn from_items(items: &[EvaluationItem]) -> Result<Self> {
        if items.is_empty() {
            return Ok(Self::default());
        }

        let overall = items
            .iter()
            .find(|item| item.is_average())
            .map(ClassStatistic::from)
            .ok_or_else(|| {
                VisionError::ResponseShape(format!(
                    "evaluation has {} rows but none named \"{}\"",
                    items.len(),
                    AVERAGE_CLASS_NAME
                ))
            })?;

        let class_statistics = items
            .iter()
            .filter(|item| !item.is_average())
            .map(ClassStatistic::from)
            .collect();

        Ok(Self {
            class_statistics,
            overall: Some(overall),
        })
    }
}

impl SceneCreate {
    /// Build the scene body, failing before any request if the evaluation
    /// rows lack an aggregate
    pub fn from_scene(scene: &NewScene) -> Result<Self> {
        let evaluation = SceneEvaluation::from_items(&scene.eval_items)?;
        let overall = evaluation.overall.as_ref();

        Ok(Self {
            scene_type: scene.scene_type.clone(),
            source_project: scene.rf_project_id,
            source_project_layer: scene.rf_project_layer_id,
            source_annotation_group: scene.source_annotation_group,
            aoi_annotation_group: scene.aoi_annotation_group,
            store_annotation_group: scene.store_annotation_group,
            f1_score: overall.map(|o| o.f1_score),
            precision: overall.map(|o| o.precision),
            recall: overall.map(|o| o.recall),
            class_statistics: evaluation.class_statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn scene(eval_items: Vec<EvaluationItem>) -> NewScene {
        NewScene {
            rf_project_id: Uuid::new_v4(),
            rf_project_layer_id: Uuid::new_v4(),
            source_annotation_group: Uuid::new_v4(),
            aoi_annotation_group: None,
            store_annotation_group: None,
            scene_name: "scene-1".to_string(),
            scene_type: "rf".to_string(),
            eval_items,
        }
    }

    #[test]
    fn test_split_class_rows_and_average() {
        let items = vec![
            EvaluationItem::new(1, "car", 0.9, 0.95, 0.85),
            EvaluationItem::new("average", "average", 0.8, 0.8, 0.8),
        ];

        let evaluation = SceneEvaluation::from_items(&items).unwrap();
        assert_eq!(evaluation.class_statistics.len(), 1);
        assert_eq!(evaluation.class_statistics[0].class_name, "car");
        assert_eq!(evaluation.overall.unwrap().f1_score, 0.8);
    }

    #[test]
    fn test_empty_items_have_no_overall() {
        let evaluation = SceneEvaluation::from_items(&[]).unwrap();
        assert!(evaluation.class_statistics.is_empty());
        assert!(evaluation.overall.is_none());
    }

    #[test]
    fn test_missing_average_is_shape_error() {
        let items = vec![EvaluationItem::new(1, "car", 0.9, 0.95, 0.85)];
        let result = SceneEvaluation::from_items(&items);
        assert!(matches!(result, Err(VisionError::ResponseShape(_))));
    }

    #[test]
    fn test_first_average_row_wins() {
        let items = vec![
            EvaluationItem::new("average", "average", 0.7, 0.7, 0.7),
            EvaluationItem::new(2, "building", 0.6, 0.5, 0.4),
            EvaluationItem::new("average", "average", 0.1, 0.1, 0.1),
        ];

        let evaluation = SceneEvaluation::from_items(&items).unwrap();
        assert_eq!(evaluation.overall.unwrap().precision, 0.7);
        assert_eq!(evaluation.class_statistics.len(), 1);
    }

    #[test]
    fn test_scene_body_with_evaluation() {
        let new_scene = scene(vec![
            EvaluationItem::new(1, "car", 0.9, 0.95, 0.85),
            EvaluationItem::new("average", "average", 0.8, 0.8, 0.8),
        ]);

        let body = serde_json::to_value(SceneCreate::from_scene(&new_scene).unwrap()).unwrap();
        assert_eq!(
            body["classStatistics"],
            json!([{"f1Score": 0.9, "recall": 0.85, "classId": 1, "precision": 0.95, "className": "car"}])
        );
        assert_eq!(body["f1Score"], json!(0.8));
        assert_eq!(body["precision"], json!(0.8));
        assert_eq!(body["recall"], json!(0.8));
        assert_eq!(body["sourceProject"], json!(new_scene.rf_project_id.to_string()));
        assert_eq!(body["aoiAnnotationGroup"], json!(null));
        assert!(body.get("sceneName").is_none());
    }

    #[test]
    fn test_scene_body_without_evaluation() {
        let body = serde_json::to_value(SceneCreate::from_scene(&scene(vec![])).unwrap()).unwrap();
        assert_eq!(body["classStatistics"], json!([]));
        assert_eq!(body["f1Score"], json!(null));
        assert_eq!(body["precision"], json!(null));
        assert_eq!(body["recall"], json!(null));
    }
}
