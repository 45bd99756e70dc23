//! Wire types for the Hetzner Cloud API. One struct per resource kind plus
//! the envelopes the API wraps single/list/action responses in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type Labels = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub id: u64,
    pub status: String,
    pub progress: u8,
    pub error: Option<ActionError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope {
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionsEnvelope {
    pub actions: Vec<Action>,
}

// ---------------------------------------------------------------- Network

#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    #[serde(rename = "type")]
    pub kind: String,
    pub ip_range: String,
    pub network_zone: String,
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub id: u64,
    pub name: String,
    pub ip_range: String,
    pub subnets: Vec<Subnet>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEnvelope {
    pub network: Network,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworksEnvelope {
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateNetworkRequest {
    pub name: String,
    pub ip_range: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddSubnetRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub ip_range: String,
    pub network_zone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkActionEnvelope {
    pub action: Action,
}

// --------------------------------------------------------------- Firewall

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub direction: String,
    pub protocol: String,
    pub port: Option<String>,
    #[serde(default)]
    pub source_ips: Vec<String>,
    #[serde(default)]
    pub destination_ips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Firewall {
    pub id: u64,
    pub name: String,
    pub rules: Vec<FirewallRule>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirewallEnvelope {
    pub firewall: Firewall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirewallsEnvelope {
    pub firewalls: Vec<Firewall>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFirewallRequest {
    pub name: String,
    pub rules: Vec<FirewallRule>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetRulesRequest {
    pub rules: Vec<FirewallRule>,
}

// ----------------------------------------------------------------- Image

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: u64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub architecture: String,
    pub created: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEnvelope {
    pub image: Image,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesEnvelope {
    pub images: Vec<Image>,
}

// ------------------------------------------------------------- ServerType

#[derive(Debug, Clone, Deserialize)]
pub struct ServerType {
    pub id: u64,
    pub name: String,
    pub architecture: String,
    pub cores: u32,
    pub memory: f64,
    pub disk: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerTypesEnvelope {
    pub server_types: Vec<ServerType>,
}

// -------------------------------------------------------------- Location

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub network_zone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsEnvelope {
    pub locations: Vec<Location>,
}

// ---------------------------------------------------------------- SshKey

#[derive(Debug, Clone, Deserialize)]
pub struct SshKey {
    pub id: u64,
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshKeyEnvelope {
    pub ssh_key: SshKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshKeysEnvelope {
    pub ssh_keys: Vec<SshKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSshKeyRequest {
    pub name: String,
    pub public_key: String,
    pub labels: Labels,
}

// ---------------------------------------------------------------- Server

#[derive(Debug, Clone, Deserialize)]
pub struct PublicNetIpv4 {
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicNetIpv6 {
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerPublicNet {
    pub ipv4: Option<PublicNetIpv4>,
    pub ipv6: Option<PublicNetIpv6>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerPrivateNet {
    pub network: u64,
    pub ip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerTypeRef {
    pub name: String,
    pub architecture: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub server_type: ServerTypeRef,
    pub public_net: ServerPublicNet,
    #[serde(default)]
    pub private_net: Vec<ServerPrivateNet>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerEnvelope {
    pub server: Server,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServersEnvelope {
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCreatedEnvelope {
    pub server: Server,
    pub action: Action,
    #[serde(default)]
    pub next_actions: Vec<Action>,
    pub root_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCreateNetwork {
    pub network: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub server_type: String,
    pub image: String,
    pub location: String,
    pub ssh_keys: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<u64>>,
    pub start_after_create: bool,
    pub labels: Labels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_group: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachToNetworkRequest {
    pub network: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnableRescueRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub ssh_keys: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnableRescueEnvelope {
    pub action: Action,
    pub root_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateImageRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateImageEnvelope {
    pub image: Image,
    pub action: Action,
}

// --------------------------------------------------------- Load balancer

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerService {
    pub protocol: String,
    pub listen_port: u16,
    pub destination_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerTarget {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerPublicNet {
    pub ipv4: Option<PublicNetIpv4>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerPrivateNet {
    pub network: u64,
    pub ip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancer {
    pub id: u64,
    pub name: String,
    pub public_net: LoadBalancerPublicNet,
    #[serde(default)]
    pub private_net: Vec<LoadBalancerPrivateNet>,
    pub services: Vec<LoadBalancerService>,
    #[serde(default)]
    pub targets: Vec<LoadBalancerTarget>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerEnvelope {
    pub load_balancer: LoadBalancer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancersEnvelope {
    pub load_balancers: Vec<LoadBalancer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateLoadBalancerRequest {
    pub name: String,
    pub load_balancer_type: String,
    pub location: String,
    pub public_interface: bool,
    pub services: Vec<LoadBalancerService>,
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddServiceRequest {
    pub protocol: String,
    pub listen_port: u16,
    pub destination_port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddLbTargetRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub server: AddLbTargetServer,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddLbTargetServer {
    pub id: u64,
}

// -------------------------------------------------------- Placement group

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementGroup {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementGroupEnvelope {
    pub placement_group: PlacementGroup,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementGroupsEnvelope {
    pub placement_groups: Vec<PlacementGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlacementGroupRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Labels,
}

// ------------------------------------------------------------ Floating IP

#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIp {
    pub id: u64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub ip: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIpEnvelope {
    pub floating_ip: FloatingIp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIpsEnvelope {
    pub floating_ips: Vec<FloatingIp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFloatingIpRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub home_location: String,
    pub labels: Labels,
}

// ------------------------------------------------------------ Certificate

#[derive(Debug, Clone, Deserialize)]
pub struct Certificate {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateEnvelope {
    pub certificate: Certificate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificatesEnvelope {
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCertificateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub domain_names: Vec<String>,
    pub labels: Labels,
}
