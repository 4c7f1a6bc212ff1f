//! Wire types of the annotation backend's REST API.
//!
//! These mirror the server's JSON verbatim; field names and string enum
//! values match the backend serializers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionType {
    #[serde(rename = "2d")]
    Dim2d,
    #[serde(rename = "3d")]
    Dim3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Annotation,
    Validation,
    Acceptance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Annotation,
    GroundTruth,
}

/// Status shared by projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Annotation,
    Validation,
    Completed,
}

pub type TaskStatus = ProjectStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Video,
    Imageset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    Annotation,
    Interpolation,
    /// Tasks without data report an empty mode.
    #[serde(rename = "")]
    Unset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareFileType {
    #[serde(rename = "DIR")]
    Directory,
    #[serde(rename = "REG")]
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    Local,
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserGroup {
    User,
    Business,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrInputType {
    Select,
    Radio,
    Checkbox,
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelType {
    Rectangle,
    Polygon,
    Polyline,
    Points,
    Ellipse,
    Cuboid,
    Skeleton,
    Mask,
    Tag,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAnnotationImporter {
    pub name: String,
    pub ext: String,
    pub version: String,
    pub enabled: bool,
    pub dimension: DimensionType,
}

pub type SerializedAnnotationExporter = SerializedAnnotationImporter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAnnotationFormats {
    pub importers: Vec<SerializedAnnotationImporter>,
    pub exporters: Vec<SerializedAnnotationExporter>,
}

/// Serverless functions listing; models are passed through untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionsResponseBody {
    pub results: Vec<serde_json::Value>,
    pub count: u64,
}

/// Query parameters of the project listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksFilter {
    #[serde(flatten)]
    pub base: ProjectsFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsFilter {
    #[serde(flatten)]
    pub base: ProjectsFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedUser {
    pub url: String,
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<UserGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
}

/// Where a project or task reads and writes its files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRef {
    pub id: u64,
    pub location: StorageLocation,
    pub cloud_storage_id: Option<u64>,
}

/// Count-plus-link summary of a related collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub count: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsSummary {
    pub count: u64,
    pub completed: u64,
    pub url: String,
    pub validation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedProject {
    pub assignee: Option<SerializedUser>,
    pub id: u64,
    pub bug_tracker: String,
    pub created_date: String,
    pub updated_date: String,
    pub dimension: Option<DimensionType>,
    pub name: String,
    pub organization: Option<u64>,
    pub guide_id: Option<u64>,
    pub owner: SerializedUser,
    pub source_storage: Option<StorageRef>,
    pub target_storage: Option<StorageRef>,
    pub url: String,
    pub tasks: CollectionSummary,
    pub task_subsets: Vec<String>,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTask {
    pub assignee: Option<SerializedUser>,
    pub bug_tracker: String,
    pub created_date: String,
    pub data: Option<u64>,
    pub data_chunk_size: Option<u64>,
    pub data_compressed_chunk_type: Option<ChunkType>,
    pub data_original_chunk_type: Option<ChunkType>,
    pub dimension: Option<DimensionType>,
    pub id: u64,
    pub image_quality: Option<u8>,
    pub jobs: JobsSummary,
    pub labels: CollectionSummary,
    pub mode: TaskMode,
    pub name: String,
    pub organization: Option<u64>,
    pub overlap: Option<u64>,
    pub owner: SerializedUser,
    pub project_id: Option<u64>,
    pub guide_id: Option<u64>,
    pub segment_size: u64,
    pub size: u64,
    pub source_storage: Option<StorageRef>,
    pub target_storage: Option<StorageRef>,
    pub status: TaskStatus,
    pub subset: String,
    pub updated_date: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedJob {
    pub assignee: Option<SerializedUser>,
    pub bug_tracker: Option<String>,
    pub data_chunk_size: Option<u64>,
    pub data_compressed_chunk_type: ChunkType,
    pub dimension: DimensionType,
    pub id: u64,
    pub issues: CollectionSummary,
    pub labels: CollectionSummary,
    pub mode: TaskMode,
    pub project_id: Option<u64>,
    pub guide_id: Option<u64>,
    pub stage: JobStage,
    pub state: JobState,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub frame_count: u64,
    pub start_frame: u64,
    pub stop_frame: u64,
    pub task_id: u64,
    pub updated_date: String,
    pub created_date: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAttribute {
    pub name: String,
    pub mutable: bool,
    pub input_type: AttrInputType,
    pub default_value: String,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub label_type: LabelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublabels: Option<Vec<SerializedLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_parent: Option<bool>,
    pub attributes: Vec<SerializedAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAbout {
    pub description: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRemoteFile {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: ShareFileType,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedUserAgreement {
    pub name: String,
    pub required: bool,
    pub text_prefix: String,
    pub url: String,
    pub url_display_text: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRegister {
    pub email: String,
    pub email_verification_required: bool,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGuide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub task_id: Option<u64>,
    pub project_id: Option<u64>,
    pub owner: SerializedUser,
    pub created_date: String,
    pub updated_date: String,
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<u64>,
    pub filename: String,
    pub created_date: String,
    pub owner: SerializedUser,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedOrganizationContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        rename = "phoneNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializedOrganization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<SerializedOrganizationContact>,
}

/// Quality-control settings of a task; every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializedQualitySettingsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iou_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oks_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_thickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_overlap_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_line_orientation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_orientation_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_groups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_match_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_covered_annotations: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_visibility_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panoptic_comparison: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_attributes: Option<bool>,
}
