//! SDK Dispatch
//!
//! Maps `(service, operation)` names to AWS SDK calls and shapes each typed
//! output into the JSON page the collectors consume. Continuation tokens are
//! passed in `params` under the API's own request member name and come back
//! under the response member name.

use super::error::AwsError;
use super::raw::{list, obj, opt, strings, tag, text, time};
use super::session::{AwsSession, Session};
use anyhow::Result;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use serde_json::{Map, Value};

/// Invoke an AWS SDK operation
pub async fn invoke_sdk(
    service: &str,
    method: &str,
    session: &AwsSession,
    params: &Value,
) -> Result<Value> {
    tracing::debug!(
        "invoke_sdk: service={}, method={}, region={}",
        service,
        method,
        session.region()
    );

    match service {
        "ec2" => invoke_ec2(method, session, params).await,
        "rds" => invoke_rds(method, session, params).await,
        "eks" => invoke_eks(method, session, params).await,
        "dynamodb" => invoke_dynamodb(method, session, params).await,
        "elb" => invoke_elb(method, session, params).await,
        "elbv2" => invoke_elbv2(method, session, params).await,
        "elasticache" => invoke_elasticache(method, session, params).await,
        "kinesis" => invoke_kinesis(method, session, params).await,
        "glue" => invoke_glue(method, session, params).await,
        "firehose" => invoke_firehose(method, session, params).await,
        "secretsmanager" => invoke_secretsmanager(method, session, params).await,
        "ecr" => invoke_ecr(method, session, params).await,
        "autoscaling" => invoke_autoscaling(method, session, params).await,
        "ses" => invoke_ses(method, session, params).await,
        "sesv2" => invoke_sesv2(method, session, params).await,
        "s3" => invoke_s3(method, session, params).await,
        "globalaccelerator" => invoke_globalaccelerator(method, session, params).await,
        "route53" => invoke_route53(method, session, params).await,
        "sts" => invoke_sts(method, session).await,
        _ => Err(unknown(service, method)),
    }
}

// =============================================================================
// EC2
// =============================================================================

async fn invoke_ec2(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_ec2::Client::new(session.config());
    let token = get_param_str_opt(params, "NextToken");

    match method {
        "describe_instances" => {
            let out = client
                .describe_instances()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Reservations", list(out.reservations(), reservation_json)),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_vpcs" => {
            let out = client
                .describe_vpcs()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Vpcs", list(out.vpcs(), |v| {
                    obj([
                        ("VpcId", text(v.vpc_id())),
                        ("State", text(v.state())),
                        ("CidrBlock", text(v.cidr_block())),
                        ("IsDefault", Value::from(v.is_default())),
                        ("DhcpOptionsId", text(v.dhcp_options_id())),
                        ("InstanceTenancy", text(v.instance_tenancy())),
                        ("OwnerId", text(v.owner_id())),
                        ("Tags", list(v.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_subnets" => {
            let out = client
                .describe_subnets()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Subnets", list(out.subnets(), |s| {
                    obj([
                        ("SubnetId", text(s.subnet_id())),
                        ("SubnetArn", text(s.subnet_arn())),
                        ("VpcId", text(s.vpc_id())),
                        ("CidrBlock", text(s.cidr_block())),
                        ("AvailabilityZone", text(s.availability_zone())),
                        ("AvailableIpAddressCount", Value::from(s.available_ip_address_count())),
                        ("State", text(s.state())),
                        ("MapPublicIpOnLaunch", Value::from(s.map_public_ip_on_launch())),
                        ("DefaultForAz", Value::from(s.default_for_az())),
                        ("Tags", list(s.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_volumes" => {
            let out = client
                .describe_volumes()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Volumes", list(out.volumes(), |v| {
                    obj([
                        ("VolumeId", text(v.volume_id())),
                        ("Size", Value::from(v.size())),
                        ("VolumeType", text(v.volume_type())),
                        ("State", text(v.state())),
                        ("AvailabilityZone", text(v.availability_zone())),
                        ("CreateTime", time(v.create_time())),
                        ("Encrypted", Value::from(v.encrypted())),
                        ("Iops", Value::from(v.iops())),
                        ("SnapshotId", text(v.snapshot_id())),
                        ("Attachments", list(v.attachments(), |a| {
                            obj([
                                ("InstanceId", text(a.instance_id())),
                                ("Device", text(a.device())),
                                ("State", text(a.state())),
                            ])
                        })),
                        ("Tags", list(v.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_snapshots" => {
            let out = client
                .describe_snapshots()
                .owner_ids("self")
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Snapshots", list(out.snapshots(), |s| {
                    obj([
                        ("SnapshotId", text(s.snapshot_id())),
                        ("VolumeId", text(s.volume_id())),
                        ("StartTime", time(s.start_time())),
                        ("State", text(s.state())),
                        ("VolumeSize", Value::from(s.volume_size())),
                        ("Description", text(s.description())),
                        ("OwnerId", text(s.owner_id())),
                        ("Encrypted", Value::from(s.encrypted())),
                        ("Progress", text(s.progress())),
                        ("Tags", list(s.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_images" => {
            let out = client
                .describe_images()
                .owners("self")
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("Images", list(out.images(), |i| {
                    obj([
                        ("ImageId", text(i.image_id())),
                        ("Name", text(i.name())),
                        ("Description", text(i.description())),
                        ("CreationDate", text(i.creation_date())),
                        ("State", text(i.state())),
                        ("Public", Value::from(i.public())),
                        ("Architecture", text(i.architecture())),
                        ("OwnerId", text(i.owner_id())),
                        ("Tags", list(i.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_nat_gateways" => {
            let out = client
                .describe_nat_gateways()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("NatGateways", list(out.nat_gateways(), |n| {
                    obj([
                        ("NatGatewayId", text(n.nat_gateway_id())),
                        ("State", text(n.state())),
                        ("VpcId", text(n.vpc_id())),
                        ("SubnetId", text(n.subnet_id())),
                        ("CreateTime", time(n.create_time())),
                        ("ConnectivityType", text(n.connectivity_type())),
                        ("NatGatewayAddresses", list(n.nat_gateway_addresses(), |a| {
                            obj([
                                ("AllocationId", text(a.allocation_id())),
                                ("PublicIp", text(a.public_ip())),
                                ("PrivateIp", text(a.private_ip())),
                                ("NetworkInterfaceId", text(a.network_interface_id())),
                            ])
                        })),
                        ("Tags", list(n.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_vpc_endpoints" => {
            let out = client
                .describe_vpc_endpoints()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("VpcEndpoints", list(out.vpc_endpoints(), |e| {
                    obj([
                        ("VpcEndpointId", text(e.vpc_endpoint_id())),
                        ("VpcEndpointType", text(e.vpc_endpoint_type())),
                        ("VpcId", text(e.vpc_id())),
                        ("ServiceName", text(e.service_name())),
                        ("State", text(e.state())),
                        ("PolicyDocument", text(e.policy_document())),
                        ("RouteTableIds", strings(e.route_table_ids())),
                        ("SubnetIds", strings(e.subnet_ids())),
                        ("CreationTimestamp", time(e.creation_timestamp())),
                        ("Tags", list(e.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_addresses" => {
            let out = client
                .describe_addresses()
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([("Addresses", list(out.addresses(), |a| {
                obj([
                    ("PublicIp", text(a.public_ip())),
                    ("AllocationId", text(a.allocation_id())),
                    ("AssociationId", text(a.association_id())),
                    ("Domain", text(a.domain())),
                    ("InstanceId", text(a.instance_id())),
                    ("NetworkInterfaceId", text(a.network_interface_id())),
                    ("PrivateIpAddress", text(a.private_ip_address())),
                    ("Tags", list(a.tags(), |t| tag(t.key(), t.value()))),
                ])
            }))]))
        },
        "describe_internet_gateways" => {
            let out = client
                .describe_internet_gateways()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("InternetGateways", list(out.internet_gateways(), |g| {
                    obj([
                        ("InternetGatewayId", text(g.internet_gateway_id())),
                        ("OwnerId", text(g.owner_id())),
                        ("Attachments", list(g.attachments(), |a| {
                            obj([("VpcId", text(a.vpc_id())), ("State", text(a.state()))])
                        })),
                        ("Tags", list(g.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_security_groups" => {
            let out = client
                .describe_security_groups()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("SecurityGroups", list(out.security_groups(), |g| {
                    obj([
                        ("GroupId", text(g.group_id())),
                        ("GroupName", text(g.group_name())),
                        ("Description", text(g.description())),
                        ("VpcId", text(g.vpc_id())),
                        ("OwnerId", text(g.owner_id())),
                        ("IpPermissions", list(g.ip_permissions(), ip_permission_json)),
                        ("IpPermissionsEgress", list(g.ip_permissions_egress(), ip_permission_json)),
                        ("Tags", list(g.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_security_group_rules" => {
            let out = client
                .describe_security_group_rules()
                .set_next_token(token)
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([
                ("SecurityGroupRules", list(out.security_group_rules(), |r| {
                    obj([
                        ("SecurityGroupRuleId", text(r.security_group_rule_id())),
                        ("GroupId", text(r.group_id())),
                        ("GroupOwnerId", text(r.group_owner_id())),
                        ("IsEgress", Value::from(r.is_egress())),
                        ("IpProtocol", text(r.ip_protocol())),
                        ("FromPort", Value::from(r.from_port())),
                        ("ToPort", Value::from(r.to_port())),
                        ("CidrIpv4", text(r.cidr_ipv4())),
                        ("CidrIpv6", text(r.cidr_ipv6())),
                        ("PrefixListId", text(r.prefix_list_id())),
                        ("ReferencedGroupInfo", opt(r.referenced_group_info()).map_or(Value::Null, |g| {
                            obj([
                                ("GroupId", text(g.group_id())),
                                ("UserId", text(g.user_id())),
                                ("VpcId", text(g.vpc_id())),
                            ])
                        })),
                        ("Description", text(r.description())),
                        ("Tags", list(r.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_regions" => {
            let out = client
                .describe_regions()
                .send()
                .await
                .api("ec2", method)?;
            Ok(obj([("Regions", list(out.regions(), |r| {
                obj([
                    ("RegionName", text(r.region_name())),
                    ("Endpoint", text(r.endpoint())),
                    ("OptInStatus", text(r.opt_in_status())),
                ])
            }))]))
        },
        _ => Err(unknown("ec2", method)),
    }
}

fn reservation_json(r: &aws_sdk_ec2::types::Reservation) -> Value {
    obj([
        ("ReservationId", text(r.reservation_id())),
        ("OwnerId", text(r.owner_id())),
        ("Instances", list(r.instances(), instance_json)),
    ])
}

fn instance_json(i: &aws_sdk_ec2::types::Instance) -> Value {
    obj([
        ("InstanceId", text(i.instance_id())),
        ("InstanceType", text(i.instance_type())),
        ("ImageId", text(i.image_id())),
        ("KeyName", text(i.key_name())),
        ("State", opt(i.state()).map_or(Value::Null, |s| {
            obj([("Code", Value::from(s.code())), ("Name", text(s.name()))])
        })),
        ("PublicIpAddress", text(i.public_ip_address())),
        ("PrivateIpAddress", text(i.private_ip_address())),
        ("VpcId", text(i.vpc_id())),
        ("SubnetId", text(i.subnet_id())),
        ("Placement", opt(i.placement()).map_or(Value::Null, |p| {
            obj([("AvailabilityZone", text(p.availability_zone()))])
        })),
        ("LaunchTime", time(i.launch_time())),
        ("SecurityGroups", list(i.security_groups(), |g| {
            obj([("GroupId", text(g.group_id())), ("GroupName", text(g.group_name()))])
        })),
        ("Tags", list(i.tags(), |t| tag(t.key(), t.value()))),
    ])
}

fn ip_permission_json(p: &aws_sdk_ec2::types::IpPermission) -> Value {
    obj([
        ("IpProtocol", text(p.ip_protocol())),
        ("FromPort", Value::from(p.from_port())),
        ("ToPort", Value::from(p.to_port())),
        ("IpRanges", list(p.ip_ranges(), |r| {
            obj([("CidrIp", text(r.cidr_ip())), ("Description", text(r.description()))])
        })),
        ("Ipv6Ranges", list(p.ipv6_ranges(), |r| {
            obj([("CidrIpv6", text(r.cidr_ipv6())), ("Description", text(r.description()))])
        })),
        ("UserIdGroupPairs", list(p.user_id_group_pairs(), |g| {
            obj([
                ("GroupId", text(g.group_id())),
                ("GroupName", text(g.group_name())),
                ("UserId", text(g.user_id())),
                ("VpcId", text(g.vpc_id())),
                ("Description", text(g.description())),
            ])
        })),
        ("PrefixListIds", list(p.prefix_list_ids(), |l| {
            obj([
                ("PrefixListId", text(l.prefix_list_id())),
                ("Description", text(l.description())),
            ])
        })),
    ])
}

// =============================================================================
// RDS
// =============================================================================

async fn invoke_rds(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_rds::Client::new(session.config());

    match method {
        "describe_db_instances" => {
            let out = client
                .describe_db_instances()
                .set_marker(get_param_str_opt(params, "Marker"))
                .send()
                .await
                .api("rds", method)?;
            Ok(obj([
                ("DBInstances", list(out.db_instances(), |d| {
                    obj([
                        ("DBInstanceIdentifier", text(d.db_instance_identifier())),
                        ("DBInstanceArn", text(d.db_instance_arn())),
                        ("DBInstanceClass", text(d.db_instance_class())),
                        ("Engine", text(d.engine())),
                        ("EngineVersion", text(d.engine_version())),
                        ("DBInstanceStatus", text(d.db_instance_status())),
                        ("Endpoint", opt(d.endpoint()).map_or(Value::Null, |e| {
                            obj([
                                ("Address", text(e.address())),
                                ("Port", Value::from(e.port())),
                                ("HostedZoneId", text(e.hosted_zone_id())),
                            ])
                        })),
                        ("AllocatedStorage", Value::from(d.allocated_storage())),
                        ("StorageType", text(d.storage_type())),
                        ("AvailabilityZone", text(d.availability_zone())),
                        ("MultiAZ", Value::from(d.multi_az())),
                        ("InstanceCreateTime", time(d.instance_create_time())),
                    ])
                })),
                ("Marker", text(out.marker())),
            ]))
        },
        _ => Err(unknown("rds", method)),
    }
}

// =============================================================================
// EKS
// =============================================================================

async fn invoke_eks(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_eks::Client::new(session.config());

    match method {
        "list_clusters" => {
            let out = client
                .list_clusters()
                .set_next_token(get_param_str_opt(params, "nextToken"))
                .send()
                .await
                .api("eks", method)?;
            Ok(obj([
                ("clusters", strings(out.clusters())),
                ("nextToken", text(out.next_token())),
            ]))
        },
        "describe_cluster" => {
            let name = get_param_str(params, "name")?;
            let out = client
                .describe_cluster()
                .name(name)
                .send()
                .await
                .api("eks", method)?;
            Ok(obj([("cluster", opt(out.cluster()).map_or(Value::Null, |c| {
                obj([
                    ("name", text(c.name())),
                    ("arn", text(c.arn())),
                    ("status", text(c.status())),
                    ("endpoint", text(c.endpoint())),
                    ("version", text(c.version())),
                    ("platformVersion", text(c.platform_version())),
                    ("roleArn", text(c.role_arn())),
                    ("createdAt", time(c.created_at())),
                ])
            }))]))
        },
        _ => Err(unknown("eks", method)),
    }
}

// =============================================================================
// DynamoDB
// =============================================================================

async fn invoke_dynamodb(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_dynamodb::Client::new(session.config());

    match method {
        "list_tables" => {
            let out = client
                .list_tables()
                .set_exclusive_start_table_name(get_param_str_opt(
                    params,
                    "ExclusiveStartTableName",
                ))
                .send()
                .await
                .api("dynamodb", method)?;
            Ok(obj([
                ("TableNames", strings(out.table_names())),
                ("LastEvaluatedTableName", text(out.last_evaluated_table_name())),
            ]))
        },
        "describe_table" => {
            let name = get_param_str(params, "TableName")?;
            let out = client
                .describe_table()
                .table_name(name)
                .send()
                .await
                .api("dynamodb", method)?;
            Ok(obj([("Table", opt(out.table()).map_or(Value::Null, |t| {
                obj([
                    ("TableName", text(t.table_name())),
                    ("TableArn", text(t.table_arn())),
                    ("TableStatus", text(t.table_status())),
                    ("CreationDateTime", time(t.creation_date_time())),
                    ("ItemCount", Value::from(t.item_count())),
                    ("TableSizeBytes", Value::from(t.table_size_bytes())),
                    ("ProvisionedThroughput", opt(t.provisioned_throughput()).map_or(Value::Null, |p| {
                        obj([
                            ("ReadCapacityUnits", Value::from(p.read_capacity_units())),
                            ("WriteCapacityUnits", Value::from(p.write_capacity_units())),
                        ])
                    })),
                    ("BillingModeSummary", opt(t.billing_mode_summary()).map_or(Value::Null, |b| {
                        obj([("BillingMode", text(b.billing_mode()))])
                    })),
                ])
            }))]))
        },
        _ => Err(unknown("dynamodb", method)),
    }
}

// =============================================================================
// Elastic Load Balancing (classic and v2)
// =============================================================================

async fn invoke_elb(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_elasticloadbalancing::Client::new(session.config());

    match method {
        "describe_load_balancers" => {
            let out = client
                .describe_load_balancers()
                .set_marker(get_param_str_opt(params, "Marker"))
                .send()
                .await
                .api("elb", method)?;
            Ok(obj([
                ("LoadBalancerDescriptions", list(out.load_balancer_descriptions(), |d| {
                    obj([
                        ("LoadBalancerName", text(d.load_balancer_name())),
                        ("DNSName", text(d.dns_name())),
                        ("Scheme", text(d.scheme())),
                        ("VPCId", text(d.vpc_id())),
                        ("CreatedTime", time(d.created_time())),
                        ("AvailabilityZones", strings(d.availability_zones())),
                        ("SecurityGroups", strings(d.security_groups())),
                        ("Instances", list(d.instances(), |i| {
                            obj([("InstanceId", text(i.instance_id()))])
                        })),
                    ])
                })),
                ("NextMarker", text(out.next_marker())),
            ]))
        },
        _ => Err(unknown("elb", method)),
    }
}

async fn invoke_elbv2(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_elasticloadbalancingv2::Client::new(session.config());

    match method {
        "describe_load_balancers" => {
            let out = client
                .describe_load_balancers()
                .set_marker(get_param_str_opt(params, "Marker"))
                .send()
                .await
                .api("elbv2", method)?;
            Ok(obj([
                ("LoadBalancers", list(out.load_balancers(), |lb| {
                    obj([
                        ("LoadBalancerArn", text(lb.load_balancer_arn())),
                        ("LoadBalancerName", text(lb.load_balancer_name())),
                        ("DNSName", text(lb.dns_name())),
                        ("Scheme", text(lb.scheme())),
                        ("VpcId", text(lb.vpc_id())),
                        ("Type", text(lb.r#type())),
                        ("IpAddressType", text(lb.ip_address_type())),
                        ("CreatedTime", time(lb.created_time())),
                        ("State", opt(lb.state()).map_or(Value::Null, |s| {
                            obj([("Code", text(s.code())), ("Reason", text(s.reason()))])
                        })),
                    ])
                })),
                ("NextMarker", text(out.next_marker())),
            ]))
        },
        _ => Err(unknown("elbv2", method)),
    }
}

// =============================================================================
// ElastiCache
// =============================================================================

async fn invoke_elasticache(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_elasticache::Client::new(session.config());

    match method {
        "describe_cache_clusters" => {
            let out = client
                .describe_cache_clusters()
                .show_cache_node_info(true)
                .set_marker(get_param_str_opt(params, "Marker"))
                .send()
                .await
                .api("elasticache", method)?;
            Ok(obj([
                ("CacheClusters", list(out.cache_clusters(), |c| {
                    obj([
                        ("CacheClusterId", text(c.cache_cluster_id())),
                        ("ARN", text(c.arn())),
                        ("Engine", text(c.engine())),
                        ("EngineVersion", text(c.engine_version())),
                        ("CacheNodeType", text(c.cache_node_type())),
                        ("CacheClusterStatus", text(c.cache_cluster_status())),
                        ("NumCacheNodes", Value::from(c.num_cache_nodes())),
                        ("PreferredAvailabilityZone", text(c.preferred_availability_zone())),
                        ("ReplicationGroupId", text(c.replication_group_id())),
                        ("CacheClusterCreateTime", time(c.cache_cluster_create_time())),
                    ])
                })),
                ("Marker", text(out.marker())),
            ]))
        },
        _ => Err(unknown("elasticache", method)),
    }
}

// =============================================================================
// Kinesis Data Streams
// =============================================================================

async fn invoke_kinesis(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_kinesis::Client::new(session.config());

    match method {
        "list_streams" => {
            let out = client
                .list_streams()
                .set_exclusive_start_stream_name(get_param_str_opt(
                    params,
                    "ExclusiveStartStreamName",
                ))
                .send()
                .await
                .api("kinesis", method)?;
            Ok(obj([
                ("StreamNames", strings(out.stream_names())),
                ("HasMoreStreams", Value::from(out.has_more_streams())),
            ]))
        },
        "describe_stream_summary" => {
            let name = get_param_str(params, "StreamName")?;
            let out = client
                .describe_stream_summary()
                .stream_name(name)
                .send()
                .await
                .api("kinesis", method)?;
            Ok(obj([(
                "StreamDescriptionSummary",
                opt(out.stream_description_summary()).map_or(Value::Null, |s| {
                    obj([
                        ("StreamName", text(s.stream_name())),
                        ("StreamARN", text(s.stream_arn())),
                        ("StreamStatus", text(s.stream_status())),
                        ("RetentionPeriodHours", Value::from(s.retention_period_hours())),
                        ("OpenShardCount", Value::from(s.open_shard_count())),
                        ("StreamCreationTimestamp", time(s.stream_creation_timestamp())),
                        ("EncryptionType", text(s.encryption_type())),
                    ])
                }),
            )]))
        },
        _ => Err(unknown("kinesis", method)),
    }
}

// =============================================================================
// Glue
// =============================================================================

async fn invoke_glue(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_glue::Client::new(session.config());

    match method {
        "get_jobs" => {
            let out = client
                .get_jobs()
                .set_next_token(get_param_str_opt(params, "NextToken"))
                .send()
                .await
                .api("glue", method)?;
            Ok(obj([
                ("Jobs", list(out.jobs(), |j| {
                    obj([
                        ("Name", text(j.name())),
                        ("Role", text(j.role())),
                        ("CreatedOn", time(j.created_on())),
                        ("LastModifiedOn", time(j.last_modified_on())),
                        ("Command", opt(j.command()).map_or(Value::Null, |c| {
                            obj([
                                ("Name", text(c.name())),
                                ("ScriptLocation", text(c.script_location())),
                            ])
                        })),
                        ("GlueVersion", text(j.glue_version())),
                        ("WorkerType", text(j.worker_type())),
                        ("NumberOfWorkers", Value::from(j.number_of_workers())),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        _ => Err(unknown("glue", method)),
    }
}

// =============================================================================
// Kinesis Data Firehose
// =============================================================================

async fn invoke_firehose(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_firehose::Client::new(session.config());

    match method {
        "list_delivery_streams" => {
            let out = client
                .list_delivery_streams()
                .set_exclusive_start_delivery_stream_name(get_param_str_opt(
                    params,
                    "ExclusiveStartDeliveryStreamName",
                ))
                .send()
                .await
                .api("firehose", method)?;
            Ok(obj([
                ("DeliveryStreamNames", strings(out.delivery_stream_names())),
                ("HasMoreDeliveryStreams", Value::from(out.has_more_delivery_streams())),
            ]))
        },
        "describe_delivery_stream" => {
            let name = get_param_str(params, "DeliveryStreamName")?;
            let out = client
                .describe_delivery_stream()
                .delivery_stream_name(name)
                .send()
                .await
                .api("firehose", method)?;
            Ok(obj([(
                "DeliveryStreamDescription",
                opt(out.delivery_stream_description()).map_or(Value::Null, |d| {
                    obj([
                        ("DeliveryStreamName", text(d.delivery_stream_name())),
                        ("DeliveryStreamArn", text(d.delivery_stream_arn())),
                        ("DeliveryStreamStatus", text(d.delivery_stream_status())),
                        ("DeliveryStreamType", text(d.delivery_stream_type())),
                        ("VersionId", text(d.version_id())),
                        ("CreateTimestamp", time(d.create_timestamp())),
                        ("LastUpdateTimestamp", time(d.last_update_timestamp())),
                    ])
                }),
            )]))
        },
        _ => Err(unknown("firehose", method)),
    }
}

// =============================================================================
// Secrets Manager
// =============================================================================

async fn invoke_secretsmanager(
    method: &str,
    session: &AwsSession,
    params: &Value,
) -> Result<Value> {
    let client = aws_sdk_secretsmanager::Client::new(session.config());

    match method {
        "list_secrets" => {
            let out = client
                .list_secrets()
                .set_next_token(get_param_str_opt(params, "NextToken"))
                .send()
                .await
                .api("secretsmanager", method)?;
            Ok(obj([
                ("SecretList", list(out.secret_list(), |s| {
                    obj([
                        ("ARN", text(s.arn())),
                        ("Name", text(s.name())),
                        ("Description", text(s.description())),
                        ("RotationEnabled", Value::from(s.rotation_enabled())),
                        ("CreatedDate", time(s.created_date())),
                        ("LastChangedDate", time(s.last_changed_date())),
                        ("LastAccessedDate", time(s.last_accessed_date())),
                        ("Tags", list(s.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        _ => Err(unknown("secretsmanager", method)),
    }
}

// =============================================================================
// ECR
// =============================================================================

async fn invoke_ecr(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_ecr::Client::new(session.config());

    match method {
        "describe_repositories" => {
            let out = client
                .describe_repositories()
                .set_next_token(get_param_str_opt(params, "nextToken"))
                .send()
                .await
                .api("ecr", method)?;
            Ok(obj([
                ("repositories", list(out.repositories(), |r| {
                    obj([
                        ("repositoryArn", text(r.repository_arn())),
                        ("registryId", text(r.registry_id())),
                        ("repositoryName", text(r.repository_name())),
                        ("repositoryUri", text(r.repository_uri())),
                        ("createdAt", time(r.created_at())),
                        ("imageTagMutability", text(r.image_tag_mutability())),
                        (
                            "imageScanningConfiguration",
                            opt(r.image_scanning_configuration()).map_or(Value::Null, |c| {
                                obj([("scanOnPush", Value::from(c.scan_on_push()))])
                            }),
                        ),
                    ])
                })),
                ("nextToken", text(out.next_token())),
            ]))
        },
        _ => Err(unknown("ecr", method)),
    }
}

// =============================================================================
// Auto Scaling
// =============================================================================

async fn invoke_autoscaling(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_autoscaling::Client::new(session.config());

    match method {
        "describe_auto_scaling_groups" => {
            let out = client
                .describe_auto_scaling_groups()
                .set_next_token(get_param_str_opt(params, "NextToken"))
                .send()
                .await
                .api("autoscaling", method)?;
            Ok(obj([
                ("AutoScalingGroups", list(out.auto_scaling_groups(), |g| {
                    obj([
                        ("AutoScalingGroupName", text(g.auto_scaling_group_name())),
                        ("AutoScalingGroupARN", text(g.auto_scaling_group_arn())),
                        ("LaunchConfigurationName", text(g.launch_configuration_name())),
                        ("LaunchTemplate", opt(g.launch_template()).map_or(Value::Null, |t| {
                            obj([
                                ("LaunchTemplateId", text(t.launch_template_id())),
                                ("LaunchTemplateName", text(t.launch_template_name())),
                                ("Version", text(t.version())),
                            ])
                        })),
                        ("MinSize", Value::from(g.min_size())),
                        ("MaxSize", Value::from(g.max_size())),
                        ("DesiredCapacity", Value::from(g.desired_capacity())),
                        ("AvailabilityZones", strings(g.availability_zones())),
                        ("HealthCheckType", text(g.health_check_type())),
                        ("CreatedTime", time(g.created_time())),
                        ("Tags", list(g.tags(), |t| tag(t.key(), t.value()))),
                    ])
                })),
                ("NextToken", text(out.next_token())),
            ]))
        },
        _ => Err(unknown("autoscaling", method)),
    }
}

// =============================================================================
// SES (v1 identities, v2 tagging)
// =============================================================================

async fn invoke_ses(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_ses::Client::new(session.config());

    match method {
        "list_identities" => {
            let out = client
                .list_identities()
                .set_next_token(get_param_str_opt(params, "NextToken"))
                .send()
                .await
                .api("ses", method)?;
            Ok(obj([
                ("Identities", strings(out.identities())),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "get_identity_verification_attributes" => {
            let identities = get_param_strings(params, "Identities");
            let out = client
                .get_identity_verification_attributes()
                .set_identities(Some(identities))
                .send()
                .await
                .api("ses", method)?;
            let attributes: Map<String, Value> = opt(out.verification_attributes())
                .map(|attrs| {
                    attrs
                        .iter()
                        .map(|(identity, attr)| {
                            (
                                identity.clone(),
                                obj([
                                    ("VerificationStatus", text(attr.verification_status())),
                                    ("VerificationToken", text(attr.verification_token())),
                                ]),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(obj([("VerificationAttributes", Value::Object(attributes))]))
        },
        _ => Err(unknown("ses", method)),
    }
}

async fn invoke_sesv2(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_sesv2::Client::new(session.config());

    match method {
        "list_tags_for_resource" => {
            let arn = get_param_str(params, "ResourceArn")?;
            let out = client
                .list_tags_for_resource()
                .resource_arn(arn)
                .send()
                .await
                .api("sesv2", method)?;
            Ok(obj([("Tags", list(out.tags(), |t| tag(t.key(), t.value())))]))
        },
        _ => Err(unknown("sesv2", method)),
    }
}

// =============================================================================
// Global services: S3, Global Accelerator, Route 53
// =============================================================================

async fn invoke_s3(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_s3::Client::new(session.config());

    match method {
        "list_buckets" => {
            let out = client
                .list_buckets()
                .set_continuation_token(get_param_str_opt(params, "ContinuationToken"))
                .send()
                .await
                .api("s3", method)?;
            Ok(obj([
                ("Buckets", list(out.buckets(), |b| {
                    obj([
                        ("Name", text(b.name())),
                        ("CreationDate", time(b.creation_date())),
                    ])
                })),
                ("Owner", opt(out.owner()).map_or(Value::Null, |o| {
                    obj([("DisplayName", text(o.display_name())), ("ID", text(o.id()))])
                })),
                ("ContinuationToken", text(out.continuation_token())),
            ]))
        },
        _ => Err(unknown("s3", method)),
    }
}

async fn invoke_globalaccelerator(
    method: &str,
    session: &AwsSession,
    params: &Value,
) -> Result<Value> {
    let client = aws_sdk_globalaccelerator::Client::new(session.config());

    match method {
        "list_accelerators" => {
            let out = client
                .list_accelerators()
                .set_next_token(get_param_str_opt(params, "NextToken"))
                .send()
                .await
                .api("globalaccelerator", method)?;
            Ok(obj([
                ("Accelerators", list(out.accelerators(), accelerator_json)),
                ("NextToken", text(out.next_token())),
            ]))
        },
        "describe_accelerator" => {
            let arn = get_param_str(params, "AcceleratorArn")?;
            let out = client
                .describe_accelerator()
                .accelerator_arn(arn)
                .send()
                .await
                .api("globalaccelerator", method)?;
            Ok(obj([(
                "Accelerator",
                opt(out.accelerator()).map_or(Value::Null, accelerator_json),
            )]))
        },
        _ => Err(unknown("globalaccelerator", method)),
    }
}

fn accelerator_json(a: &aws_sdk_globalaccelerator::types::Accelerator) -> Value {
    obj([
        ("AcceleratorArn", text(a.accelerator_arn())),
        ("Name", text(a.name())),
        ("IpAddressType", text(a.ip_address_type())),
        ("Enabled", Value::from(a.enabled())),
        ("DnsName", text(a.dns_name())),
        ("Status", text(a.status())),
        ("CreatedTime", time(a.created_time())),
        ("LastModifiedTime", time(a.last_modified_time())),
    ])
}

async fn invoke_route53(method: &str, session: &AwsSession, params: &Value) -> Result<Value> {
    let client = aws_sdk_route53::Client::new(session.config());

    match method {
        "list_hosted_zones" => {
            let out = client
                .list_hosted_zones()
                .set_marker(get_param_str_opt(params, "Marker"))
                .send()
                .await
                .api("route53", method)?;
            Ok(obj([
                ("HostedZones", list(out.hosted_zones(), |z| {
                    obj([
                        ("Id", text(z.id())),
                        ("Name", text(z.name())),
                        ("CallerReference", text(z.caller_reference())),
                        ("Config", opt(z.config()).map_or(Value::Null, |c| {
                            obj([
                                ("Comment", text(c.comment())),
                                ("PrivateZone", Value::from(c.private_zone())),
                            ])
                        })),
                        ("ResourceRecordSetCount", Value::from(z.resource_record_set_count())),
                    ])
                })),
                ("IsTruncated", Value::from(out.is_truncated())),
                ("NextMarker", text(out.next_marker())),
            ]))
        },
        _ => Err(unknown("route53", method)),
    }
}

// =============================================================================
// STS
// =============================================================================

async fn invoke_sts(method: &str, session: &AwsSession) -> Result<Value> {
    let client = aws_sdk_sts::Client::new(session.config());

    match method {
        "get_caller_identity" => {
            let out = client
                .get_caller_identity()
                .send()
                .await
                .api("sts", method)?;
            Ok(obj([
                ("Account", text(out.account())),
                ("Arn", text(out.arn())),
                ("UserId", text(out.user_id())),
            ]))
        },
        _ => Err(unknown("sts", method)),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Converts SDK errors into [`AwsError`], keeping the service's error code
trait SdkResultExt<T> {
    fn api(self, service: &str, operation: &str) -> Result<T>;
}

impl<T, E, R> SdkResultExt<T> for std::result::Result<T, SdkError<E, R>>
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn api(self, service: &str, operation: &str) -> Result<T> {
        self.map_err(|err| {
            let detail = DisplayErrorContext(&err).to_string();
            match err.code() {
                Some(code) => AwsError::Api {
                    service: service.to_string(),
                    operation: operation.to_string(),
                    code: code.to_string(),
                    message: err.message().map(str::to_string).unwrap_or(detail),
                }
                .into(),
                None if detail.to_lowercase().contains("credentials") => {
                    AwsError::Credentials(detail).into()
                }
                None => AwsError::Api {
                    service: service.to_string(),
                    operation: operation.to_string(),
                    code: "Unknown".to_string(),
                    message: detail,
                }
                .into(),
            }
        })
    }
}

fn unknown(service: &str, method: &str) -> anyhow::Error {
    AwsError::UnknownOperation {
        service: service.to_string(),
        operation: method.to_string(),
    }
    .into()
}

fn get_param_str(params: &Value, key: &str) -> Result<String> {
    get_param_str_opt(params, key).ok_or_else(|| AwsError::MissingParameter(key.to_string()).into())
}

fn get_param_str_opt(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| {
            if let Value::Array(arr) = v {
                arr.first().and_then(|v| v.as_str())
            } else {
                v.as_str()
            }
        })
        .map(|s| s.to_string())
}

fn get_param_strings(params: &Value, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_lookup_accepts_scalars_and_arrays() {
        let params = json!({"NextToken": "abc", "name": ["cluster-1"]});
        assert_eq!(get_param_str_opt(&params, "NextToken").as_deref(), Some("abc"));
        assert_eq!(get_param_str(&params, "name").unwrap(), "cluster-1");
        assert!(get_param_str_opt(&params, "Marker").is_none());
    }

    #[test]
    fn test_missing_param_is_typed() {
        let err = get_param_str(&json!({}), "TableName").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AwsError>(),
            Some(AwsError::MissingParameter(key)) if key == "TableName"
        ));
    }

    #[test]
    fn test_param_strings() {
        let params = json!({"Identities": ["a@example.com", "example.com"]});
        assert_eq!(
            get_param_strings(&params, "Identities"),
            vec!["a@example.com".to_string(), "example.com".to_string()]
        );
        assert!(get_param_strings(&params, "Other").is_empty());
    }
}
