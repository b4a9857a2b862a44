//! Pattern tables for privilege classification.
//!
//! Both tables are ordered data: `(regex source, category)` rows compiled
//! once on first use. Editing classification behavior means editing these
//! rows, not control flow.

use std::sync::OnceLock;

use regex::Regex;

/// Why a script is believed to need elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationCategory {
    DirectSudo,
    PackageManager,
    ServiceControl,
    UserAdmin,
    DiskAndMount,
    NetworkInterface,
    Firewall,
    Scheduling,
    CredentialFiles,
    RemoteRoot,
    OctalPermissions,
    SystemPaths,
    SystemWrite,
    SocketInspection,
    PacketCapture,
    PortScanning,
    ContainerEngine,
    LogManagement,
    LogFiles,
    KernelModules,
    HardwareInfo,
    DiskHealth,
}

impl ElevationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectSudo => "direct_sudo",
            Self::PackageManager => "package_manager",
            Self::ServiceControl => "service_control",
            Self::UserAdmin => "user_admin",
            Self::DiskAndMount => "disk_and_mount",
            Self::NetworkInterface => "network_interface",
            Self::Firewall => "firewall",
            Self::Scheduling => "scheduling",
            Self::CredentialFiles => "credential_files",
            Self::RemoteRoot => "remote_root",
            Self::OctalPermissions => "octal_permissions",
            Self::SystemPaths => "system_paths",
            Self::SystemWrite => "system_write",
            Self::SocketInspection => "socket_inspection",
            Self::PacketCapture => "packet_capture",
            Self::PortScanning => "port_scanning",
            Self::ContainerEngine => "container_engine",
            Self::LogManagement => "log_management",
            Self::LogFiles => "log_files",
            Self::KernelModules => "kernel_modules",
            Self::HardwareInfo => "hardware_info",
            Self::DiskHealth => "disk_health",
        }
    }
}

/// A reason a match might be a false positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionCategory {
    NonInteractiveSudo,
    CommentedSudo,
    EchoedSudo,
    SudoExistenceCheck,
}

impl SuppressionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonInteractiveSudo => "non_interactive_sudo",
            Self::CommentedSudo => "commented_sudo",
            Self::EchoedSudo => "echoed_sudo",
            Self::SudoExistenceCheck => "sudo_existence_check",
        }
    }
}

/// Commands and command shapes that typically need root.
const ELEVATION_ROWS: &[(&str, ElevationCategory)] = &[
    (r"(?i)\bsudo\s+", ElevationCategory::DirectSudo),
    (r"(?i)\bsudo\s+\$", ElevationCategory::DirectSudo),
    (
        r"(?i)\b(apt|yum|dnf|pacman|zypper)\s+(install|remove|update|upgrade)",
        ElevationCategory::PackageManager,
    ),
    (
        r"(?i)\b(systemctl|service)\s+(start|stop|restart|enable|disable)",
        ElevationCategory::ServiceControl,
    ),
    (
        r"(?i)\b(usermod|useradd|userdel|groupadd|groupdel)",
        ElevationCategory::UserAdmin,
    ),
    (
        r"(?i)\b(mount|umount|fdisk|parted|mkfs)",
        ElevationCategory::DiskAndMount,
    ),
    (
        r"(?i)\b(ifconfig|ip\s+link|ip\s+addr|ip\s+route)",
        ElevationCategory::NetworkInterface,
    ),
    (
        r"(?i)\b(ufw|iptables|firewall-cmd)",
        ElevationCategory::Firewall,
    ),
    (r"(?i)\b(crontab|at)", ElevationCategory::Scheduling),
    (
        r"(?i)\b(visudo|passwd|chpasswd)",
        ElevationCategory::CredentialFiles,
    ),
    (
        r"(?i)\b(rsync|scp|ssh)\s+.*root@",
        ElevationCategory::RemoteRoot,
    ),
    (
        r"(?i)\b(chmod|chown|chgrp)\s+.*[0-7]{3,4}",
        ElevationCategory::OctalPermissions,
    ),
    (
        r"(?i)\b(rm|rmdir|mkdir|touch|cp|mv)\s+.*/(etc|var|usr|opt|root)",
        ElevationCategory::SystemPaths,
    ),
    (
        r"(?i)\b(echo|cat|tee)\s+.*>\s*/etc/",
        ElevationCategory::SystemWrite,
    ),
    (
        r"(?i)\b(echo|cat|tee)\s+.*>\s*/var/",
        ElevationCategory::SystemWrite,
    ),
    (
        r"(?i)\b(echo|cat|tee)\s+.*>\s*/usr/",
        ElevationCategory::SystemWrite,
    ),
    (
        r"(?i)\b(netstat|ss|lsof)\s+-[a-z]*p",
        ElevationCategory::SocketInspection,
    ),
    (
        r"(?i)\b(tcpdump|wireshark|tshark)",
        ElevationCategory::PacketCapture,
    ),
    (r"(?i)\b(nmap|masscan|zmap)", ElevationCategory::PortScanning),
    (
        r"(?i)\bdocker\s+(run|start|stop|restart|rm|rmi|build|push|pull)",
        ElevationCategory::ContainerEngine,
    ),
    (
        r"(?i)\b(podman|docker-compose)",
        ElevationCategory::ContainerEngine,
    ),
    (
        r"(?i)\b(journalctl|logrotate)",
        ElevationCategory::LogManagement,
    ),
    (
        r"(?i)\b(tail|head|grep|awk|sed)\s+.*/var/log/",
        ElevationCategory::LogFiles,
    ),
    (
        r"(?i)\b(modprobe|insmod|rmmod|lsmod)",
        ElevationCategory::KernelModules,
    ),
    (
        r"(?i)\b(lspci|lsusb|lscpu|lsblk)",
        ElevationCategory::HardwareInfo,
    ),
    (
        r"(?i)\b(hdparm|smartctl|badblocks)",
        ElevationCategory::DiskHealth,
    ),
];

/// Shapes where the elevation keyword appears without an interactive
/// elevation requirement.
const SUPPRESSION_ROWS: &[(&str, SuppressionCategory)] = &[
    (
        r"(?i)\b(sudo\s+-n|sudo\s+--non-interactive)",
        SuppressionCategory::NonInteractiveSudo,
    ),
    (r"(?i)\b#.*sudo", SuppressionCategory::CommentedSudo),
    (r"(?i)\becho.*sudo", SuppressionCategory::EchoedSudo),
    (
        r"(?i)\b(which|whereis|type)\s+sudo",
        SuppressionCategory::SudoExistenceCheck,
    ),
];

static ELEVATION_PATTERNS: OnceLock<Vec<(Regex, ElevationCategory)>> = OnceLock::new();
static SUPPRESSION_PATTERNS: OnceLock<Vec<(Regex, SuppressionCategory)>> = OnceLock::new();

pub(crate) fn elevation_patterns() -> &'static [(Regex, ElevationCategory)] {
    ELEVATION_PATTERNS.get_or_init(|| {
        ELEVATION_ROWS
            .iter()
            .map(|(src, category)| (Regex::new(src).unwrap(), *category))
            .collect()
    })
}

pub(crate) fn suppression_patterns() -> &'static [(Regex, SuppressionCategory)] {
    SUPPRESSION_PATTERNS.get_or_init(|| {
        SUPPRESSION_ROWS
            .iter()
            .map(|(src, category)| (Regex::new(src).unwrap(), *category))
            .collect()
    })
}
