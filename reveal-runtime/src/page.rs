//! # Page 模块
//!
//! 内存中的页面模型，实现 [`Surface`]。
//!
//! 页面文档（JSON）示例：
//!
//! ```json
//! {
//!   "elements": [
//!     { "id": "services-1", "category": { "card": "service" }, "children": ["f1", "f2"] },
//!     { "id": "f1", "role": "feature" },
//!     { "id": "f2", "role": "feature" },
//!     { "id": "stat-aum", "category": "stat", "text": "£65M+" }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::surface::{Category, ChildRole, ElementId, Marker, Motion, StyleProperty, Surface};

/// 页面元素
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageElement {
    pub id: ElementId,
    /// 顶层类别（被观察的元素才有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// 子元素角色
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChildRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// SVG 路径长度（非路径元素为 None）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub markers: BTreeSet<Marker>,
    /// 最近一次应用的声明式动画
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<Motion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<StyleProperty, f64>,
}

impl PageElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(id),
            category: None,
            role: None,
            text: None,
            path_length: None,
            children: Vec::new(),
            markers: BTreeSet::new(),
            motion: None,
            style: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_role(mut self, role: ChildRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_path_length(mut self, length: f64) -> Self {
        self.path_length = Some(length);
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(ElementId::new).collect();
        self
    }
}

/// 页面文档（序列化格式）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub elements: Vec<PageElement>,
    #[serde(default)]
    pub reduced_motion: bool,
}

/// 内存页面
#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: Vec<PageElement>,
    index: HashMap<ElementId, usize>,
    reduced_motion: bool,
    /// 模拟不支持的宿主操作（按方法名）
    unsupported: BTreeSet<String>,
}

impl From<PageDocument> for Page {
    fn from(document: PageDocument) -> Self {
        let mut page = Self::from_elements(document.elements);
        page.reduced_motion = document.reduced_motion;
        page
    }
}

impl Page {
    /// 从元素列表构建（重复 id 以后出现的为准）
    pub fn from_elements(elements: Vec<PageElement>) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(idx, element)| (element.id.clone(), idx))
            .collect();
        Self {
            elements,
            index,
            reduced_motion: false,
            unsupported: BTreeSet::new(),
        }
    }

    /// 解析 JSON 页面文档
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let document: PageDocument = serde_json::from_str(json)?;
        Ok(document.into())
    }

    /// 导出当前状态
    pub fn to_document(&self) -> PageDocument {
        PageDocument {
            elements: self.elements.clone(),
            reduced_motion: self.reduced_motion,
        }
    }

    /// 查询元素
    pub fn element(&self, id: &ElementId) -> Option<&PageElement> {
        self.index.get(id).map(|&idx| &self.elements[idx])
    }

    /// 移除元素（模拟卸载），返回是否存在
    pub fn remove(&mut self, id: &ElementId) -> bool {
        let Some(idx) = self.index.remove(id) else {
            return false;
        };
        self.elements.remove(idx);
        for element in &mut self.elements {
            element.children.retain(|child| child != id);
        }
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(idx, element)| (element.id.clone(), idx))
            .collect();
        true
    }

    /// 标记某个宿主操作为不支持（用于测试降级）
    pub fn disable_operation(&mut self, operation: impl Into<String>) {
        self.unsupported.insert(operation.into());
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// 读取样式数值
    pub fn style(&self, id: &ElementId, property: StyleProperty) -> Option<f64> {
        self.element(id)?.style.get(&property).copied()
    }

    fn check(&self, operation: &str) -> Result<(), SurfaceError> {
        if self.unsupported.contains(operation) {
            return Err(SurfaceError::Unsupported {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn get(&self, id: &ElementId) -> Result<&PageElement, SurfaceError> {
        self.element(id)
            .ok_or_else(|| SurfaceError::MissingElement(id.clone()))
    }

    fn get_mut(&mut self, id: &ElementId) -> Result<&mut PageElement, SurfaceError> {
        match self.index.get(id) {
            Some(&idx) => Ok(&mut self.elements[idx]),
            None => Err(SurfaceError::MissingElement(id.clone())),
        }
    }

    fn collect_descendants(
        &self,
        id: &ElementId,
        role: ChildRole,
        visited: &mut BTreeSet<ElementId>,
        out: &mut Vec<ElementId>,
    ) {
        let Some(element) = self.element(id) else {
            return;
        };
        for child_id in &element.children {
            // 跳过重复访问（环形引用）
            if !visited.insert(child_id.clone()) {
                continue;
            }
            if let Some(child) = self.element(child_id) {
                if child.role == Some(role) {
                    out.push(child_id.clone());
                }
                self.collect_descendants(child_id, role, visited, out);
            }
        }
    }
}

impl Surface for Page {
    fn scan(&self) -> Vec<(ElementId, Category)> {
        self.elements
            .iter()
            .filter_map(|element| element.category.map(|c| (element.id.clone(), c)))
            .collect()
    }

    fn contains(&self, id: &ElementId) -> bool {
        self.index.contains_key(id)
    }

    fn text(&self, id: &ElementId) -> Result<String, SurfaceError> {
        Ok(self.get(id)?.text.clone().unwrap_or_default())
    }

    fn set_text(&mut self, id: &ElementId, text: &str) -> Result<(), SurfaceError> {
        self.check("set_text")?;
        self.get_mut(id)?.text = Some(text.to_string());
        Ok(())
    }

    fn add_marker(&mut self, id: &ElementId, marker: Marker) -> Result<bool, SurfaceError> {
        self.check("add_marker")?;
        Ok(self.get_mut(id)?.markers.insert(marker))
    }

    fn has_marker(&self, id: &ElementId, marker: Marker) -> bool {
        self.element(id)
            .is_some_and(|element| element.markers.contains(&marker))
    }

    fn apply_motion(&mut self, id: &ElementId, motion: Motion) -> Result<(), SurfaceError> {
        self.check("apply_motion")?;
        let motion = if self.reduced_motion {
            motion.instant()
        } else {
            motion
        };
        self.get_mut(id)?.motion = Some(motion);
        Ok(())
    }

    fn path_length(&self, id: &ElementId) -> Result<f64, SurfaceError> {
        self.check("path_length")?;
        self.get(id)?
            .path_length
            .ok_or_else(|| SurfaceError::NotAPath(id.clone()))
    }

    fn set_property(
        &mut self,
        id: &ElementId,
        property: StyleProperty,
        value: f64,
    ) -> Result<(), SurfaceError> {
        self.check("set_property")?;
        self.get_mut(id)?.style.insert(property, value);
        Ok(())
    }

    fn children(&self, id: &ElementId, role: ChildRole) -> Result<Vec<ElementId>, SurfaceError> {
        self.get(id)?;
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_descendants(id, role, &mut visited, &mut out);
        Ok(out)
    }

    fn set_reduced_motion(&mut self, enabled: bool) {
        self.reduced_motion = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CardKind, MotionName};

    fn sample_page() -> Page {
        Page::from_elements(vec![
            PageElement::new("card")
                .with_category(Category::Card(CardKind::Service))
                .with_children(["list", "icon"]),
            PageElement::new("list").with_children(["f1", "f2"]),
            PageElement::new("f1").with_role(ChildRole::Feature),
            PageElement::new("f2").with_role(ChildRole::Feature),
            PageElement::new("icon").with_role(ChildRole::Icon),
            PageElement::new("stat")
                .with_category(Category::Stat)
                .with_text("£65M+"),
        ])
    }

    #[test]
    fn test_scan_in_document_order() {
        let page = sample_page();
        let scanned: Vec<String> = page.scan().into_iter().map(|(id, _)| id.0).collect();
        assert_eq!(scanned, vec!["card", "stat"]);
    }

    #[test]
    fn test_children_are_deep_and_filtered() {
        let page = sample_page();
        let features = page.children(&"card".into(), ChildRole::Feature).unwrap();
        assert_eq!(features, vec![ElementId::from("f1"), ElementId::from("f2")]);

        let icons = page.children(&"card".into(), ChildRole::Icon).unwrap();
        assert_eq!(icons.len(), 1);

        assert!(matches!(
            page.children(&"missing".into(), ChildRole::Icon),
            Err(SurfaceError::MissingElement(_))
        ));
    }

    #[test]
    fn test_add_marker_is_idempotent() {
        let mut page = sample_page();
        let id = ElementId::from("stat");
        assert!(page.add_marker(&id, Marker::AnimateIn).unwrap());
        assert!(!page.add_marker(&id, Marker::AnimateIn).unwrap());
        assert!(page.has_marker(&id, Marker::AnimateIn));
    }

    #[test]
    fn test_path_length_requires_path() {
        let page = Page::from_elements(vec![
            PageElement::new("path").with_path_length(120.0),
            PageElement::new("div"),
        ]);
        assert_eq!(page.path_length(&"path".into()).unwrap(), 120.0);
        assert!(matches!(
            page.path_length(&"div".into()),
            Err(SurfaceError::NotAPath(_))
        ));
    }

    #[test]
    fn test_disabled_operation() {
        let mut page = sample_page();
        page.disable_operation("apply_motion");
        let motion = Motion::new(MotionName::SlideInUp, 800, Default::default());
        let err = page.apply_motion(&"card".into(), motion).unwrap_err();
        assert!(err.is_runtime_failure());
    }

    #[test]
    fn test_reduced_motion_collapses_duration() {
        let mut page = sample_page();
        page.set_reduced_motion(true);
        let motion = Motion::new(MotionName::SlideInUp, 800, Default::default());
        page.apply_motion(&"card".into(), motion).unwrap();
        let applied = page.element(&"card".into()).unwrap().motion.unwrap();
        assert_eq!(applied.duration_ms, 0);
    }

    #[test]
    fn test_document_round_trip() {
        let json = r#"{
            "elements": [
                { "id": "ring", "category": { "chart": "ring" }, "children": ["arc", "label"] },
                { "id": "arc", "role": "ring", "path_length": 251.2 },
                { "id": "label", "role": "label", "text": "20%" }
            ]
        }"#;
        let page = Page::from_json(json).unwrap();
        assert_eq!(page.scan().len(), 1);
        assert_eq!(page.text(&"label".into()).unwrap(), "20%");

        let document = page.to_document();
        assert_eq!(document.elements.len(), 3);
    }

    #[test]
    fn test_remove_element() {
        let mut page = sample_page();
        assert!(page.remove(&"f1".into()));
        assert!(!page.contains(&"f1".into()));
        let features = page.children(&"card".into(), ChildRole::Feature).unwrap();
        assert_eq!(features, vec![ElementId::from("f2")]);
        assert!(!page.remove(&"f1".into()));
    }
}
