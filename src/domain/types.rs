// ==========================================
// 货运装车调度核心 - 领域类型定义
// ==========================================
// 职责: 状态、角色、岗位等封闭枚举
// 红线: 角色/岗位一律使用枚举，禁止自由字符串比较
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 排队状态 (Queue Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Waiting,  // 等待装车 (MENUNGGU)
    Loading,  // 装车中 (MUAT)
    Departed, // 已发车 (BERANGKAT)
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QueueStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WAITING" => Some(QueueStatus::Waiting),
            "LOADING" => Some(QueueStatus::Loading),
            "DEPARTED" => Some(QueueStatus::Departed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "WAITING",
            QueueStatus::Loading => "LOADING",
            QueueStatus::Departed => "DEPARTED",
        }
    }

    /// 判断状态转换是否合法
    ///
    /// 合法转换仅有: WAITING→LOADING, LOADING→DEPARTED
    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (QueueStatus::Waiting, QueueStatus::Loading)
                | (QueueStatus::Loading, QueueStatus::Departed)
        )
    }
}

// ==========================================
// 运单状态 (Shipment Receipt Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,   // 待装车
    Loaded,    // 已装车
    Delivered, // 已送达
    Cancelled, // 已取消
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ShipmentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(ShipmentStatus::Pending),
            "LOADED" => Some(ShipmentStatus::Loaded),
            "DELIVERED" => Some(ShipmentStatus::Delivered),
            "CANCELLED" => Some(ShipmentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::Loaded => "LOADED",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 装车状态 (Loading Status)
// ==========================================
// MUAT 与 BERANGKAT 由发车时间派生，SAMPAI 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadingStatus {
    #[serde(rename = "MUAT")]
    Muat, // 装车中
    #[serde(rename = "BERANGKAT")]
    Berangkat, // 已发车
    #[serde(rename = "SAMPAI")]
    Sampai, // 已到达
}

impl fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl LoadingStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MUAT" => Some(LoadingStatus::Muat),
            "BERANGKAT" => Some(LoadingStatus::Berangkat),
            "SAMPAI" => Some(LoadingStatus::Sampai),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LoadingStatus::Muat => "MUAT",
            LoadingStatus::Berangkat => "BERANGKAT",
            LoadingStatus::Sampai => "SAMPAI",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadingStatus::Sampai)
    }
}

// ==========================================
// 付款方式 (Payment Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Cash,     // 现付 (TUNAI)
    Cod,      // 到付
    Invoice,  // 月结
}

impl PaymentType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CASH" | "TUNAI" => Some(PaymentType::Cash),
            "COD" => Some(PaymentType::Cod),
            "INVOICE" | "TAGIHAN" => Some(PaymentType::Invoice),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "CASH",
            PaymentType::Cod => "COD",
            PaymentType::Invoice => "INVOICE",
        }
    }
}

// ==========================================
// 系统角色 (Role)
// ==========================================
// 角色代码映射表: code ↔ Role，大小写不敏感
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,       // 总监
    AdminManager,   // 行政经理
    HrManager,      // 人事经理
    BranchHead,     // 网点负责人 (kepala cabang)
    StaffAdmin,     // 行政专员
    StaffPenjualan, // 销售专员
    Kasir,          // 收银
    Checker,        // 理货员
    Supir,          // 司机
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Role {
    /// 全部角色
    pub const ALL: [Role; 9] = [
        Role::Director,
        Role::AdminManager,
        Role::HrManager,
        Role::BranchHead,
        Role::StaffAdmin,
        Role::StaffPenjualan,
        Role::Kasir,
        Role::Checker,
        Role::Supir,
    ];

    /// 网点负责人可分配的员工级角色
    pub const STAFF_TIER: [Role; 5] = [
        Role::StaffAdmin,
        Role::StaffPenjualan,
        Role::Kasir,
        Role::Checker,
        Role::Supir,
    ];

    /// 角色代码
    pub fn code(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::AdminManager => "admin_manager",
            Role::HrManager => "hr_manager",
            Role::BranchHead => "branch_head",
            Role::StaffAdmin => "staff_admin",
            Role::StaffPenjualan => "staff_penjualan",
            Role::Kasir => "kasir",
            Role::Checker => "checker",
            Role::Supir => "supir",
        }
    }

    /// 从角色代码解析（未知代码返回 None）
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_lowercase().replace('-', "_");
        Role::ALL.iter().copied().find(|r| r.code() == normalized)
    }

    /// 是否为管理层角色（总监/行政经理/人事经理）
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Director | Role::AdminManager | Role::HrManager)
    }

    pub fn is_staff_tier(&self) -> bool {
        Role::STAFF_TIER.contains(self)
    }
}

// ==========================================
// 岗位职能 (Job Function)
// ==========================================
// 候选人筛选依据显式岗位字段，不再匹配职位名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobFunction {
    Checker,   // 理货/操作员
    Driver,    // 司机
    Assistant, // 随车助手 (kenek)
    Admin,     // 行政
    Sales,     // 销售
    Cashier,   // 收银
    Other,     // 其他
}

impl fmt::Display for JobFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 历史职位名称 → 岗位职能 映射表（小写）
const LEGACY_TITLE_MAP: &[(&str, JobFunction)] = &[
    ("checker", JobFunction::Checker),
    ("operator", JobFunction::Checker),
    ("supir", JobFunction::Driver),
    ("driver", JobFunction::Driver),
    ("kenek", JobFunction::Assistant),
    ("helper", JobFunction::Assistant),
    ("staff admin", JobFunction::Admin),
    ("admin", JobFunction::Admin),
    ("staff penjualan", JobFunction::Sales),
    ("sales", JobFunction::Sales),
    ("kasir", JobFunction::Cashier),
    ("cashier", JobFunction::Cashier),
];

impl JobFunction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CHECKER" => Some(JobFunction::Checker),
            "DRIVER" => Some(JobFunction::Driver),
            "ASSISTANT" => Some(JobFunction::Assistant),
            "ADMIN" => Some(JobFunction::Admin),
            "SALES" => Some(JobFunction::Sales),
            "CASHIER" => Some(JobFunction::Cashier),
            "OTHER" => Some(JobFunction::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobFunction::Checker => "CHECKER",
            JobFunction::Driver => "DRIVER",
            JobFunction::Assistant => "ASSISTANT",
            JobFunction::Admin => "ADMIN",
            JobFunction::Sales => "SALES",
            JobFunction::Cashier => "CASHIER",
            JobFunction::Other => "OTHER",
        }
    }

    /// 将导入的自由文本职位名称映射为岗位职能
    ///
    /// 仅整词精确匹配映射表，未知名称归为 Other
    pub fn from_legacy_title(title: &str) -> Self {
        let normalized = title.trim().to_lowercase();
        LEGACY_TITLE_MAP
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, function)| *function)
            .unwrap_or(JobFunction::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_transition_table() {
        assert!(QueueStatus::Waiting.can_transition_to(QueueStatus::Loading));
        assert!(QueueStatus::Loading.can_transition_to(QueueStatus::Departed));

        assert!(!QueueStatus::Waiting.can_transition_to(QueueStatus::Departed));
        assert!(!QueueStatus::Loading.can_transition_to(QueueStatus::Waiting));
        assert!(!QueueStatus::Departed.can_transition_to(QueueStatus::Waiting));
        assert!(!QueueStatus::Departed.can_transition_to(QueueStatus::Loading));
        assert!(!QueueStatus::Waiting.can_transition_to(QueueStatus::Waiting));
    }

    #[test]
    fn test_role_code_mapping() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::from_code("  Director "), Some(Role::Director));
        assert_eq!(Role::from_code("admin-manager"), Some(Role::AdminManager));
        assert_eq!(Role::from_code("superuser"), None);
    }

    #[test]
    fn test_legacy_title_mapping() {
        assert_eq!(JobFunction::from_legacy_title("Checker"), JobFunction::Checker);
        assert_eq!(JobFunction::from_legacy_title("OPERATOR"), JobFunction::Checker);
        assert_eq!(JobFunction::from_legacy_title(" Supir "), JobFunction::Driver);
        assert_eq!(JobFunction::from_legacy_title("driver"), JobFunction::Driver);
        // 子串不算匹配
        assert_eq!(JobFunction::from_legacy_title("Supervisor"), JobFunction::Other);
    }

    #[test]
    fn test_loading_status_serde_names() {
        let json = serde_json::to_string(&LoadingStatus::Berangkat).unwrap();
        assert_eq!(json, "\"BERANGKAT\"");
        assert_eq!(LoadingStatus::from_str("sampai"), Some(LoadingStatus::Sampai));
        assert!(LoadingStatus::Sampai.is_terminal());
        assert!(!LoadingStatus::Muat.is_terminal());
    }
}
